use std::fs;
use std::io;
use std::mem;
use std::path;

use rand::distributions;
use rand::Rng as _;

use crate::util::Tap as _;

/// Attempts at finding an unused file name before giving up.
const ATTEMPTS: usize = 16;

/// Uniquely named scratch file that is removed when dropped.
///
/// Removal happens exactly once: either in `Drop`, or never if creation failed.
#[derive(Debug)]
pub struct Temp {
    path: path::PathBuf,
    file: Option<fs::File>,
}

impl Temp {
    pub fn new(directory: &path::Path, prefix: &str, suffix: &str) -> io::Result<Self> {
        fs::create_dir_all(directory)?;

        for _ in 0..ATTEMPTS {
            let path = rand::thread_rng()
                .sample_iter(distributions::Alphanumeric)
                .take(8)
                .map(char::from)
                .collect::<String>()
                .tap(|name| format!("{}{}{}", prefix, name, suffix))
                .tap(|name| directory.join(name));

            match fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => {
                    log::debug!("Created temporary file `{}`", path.display());
                    return Ok(Temp {
                        path,
                        file: Some(file),
                    });
                }
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(error) => return Err(error),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "Failed to create temporary file in {} after {} attempts",
                directory.display(),
                ATTEMPTS,
            ),
        ))
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }

    /// Open an independent read handle positioned at the start of the file.
    pub fn reopen(&self) -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .read(true)
            .write(false)
            .open(&self.path)
    }
}

impl io::Write for Temp {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.file
            .as_mut()
            .expect("[UNREACHABLE]: missing `Temp` file")
            .write(buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .as_mut()
            .expect("[UNREACHABLE]: missing `Temp` file")
            .flush()
    }
}

impl Drop for Temp {
    fn drop(&mut self) {
        // Close the handle first: some platforms refuse to unlink open files.
        mem::take(&mut self.file);
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temporary file `{}`", self.path.display()),
            Err(error) => log::warn!(
                "Failed to remove temporary file `{}`: {}",
                self.path.display(),
                error,
            ),
        }
    }
}
