use structopt::StructOpt;

use spill::command;

/// Buffer binary payloads and transcode them to and from base64.
#[derive(StructOpt)]
enum Command {
    Encode(command::Encode),
    Decode(command::Decode),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    match Command::from_args() {
        Command::Encode(encode) => encode.run(),
        Command::Decode(decode) => decode.run(),
    }
}
