use crate::Error;
use crate::Result;

/// Lifecycle of a [`WritableBlob`](crate::WritableBlob).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// Nothing written and no output stream obtained.
    #[default]
    New,
    /// Output stream open, or data copied in without committing.
    Uncommitted,
    /// Sealed: no further writes, reads always allowed.
    Committed,
}

/// State machine shared by every writable blob.
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    state: State,
    streaming: bool,
}

impl Lifecycle {
    pub fn state(&self) -> State {
        self.state
    }

    pub fn open_output_stream(&mut self) -> Result<()> {
        match self.state {
            State::New => {
                self.state = State::Uncommitted;
                self.streaming = true;
                Ok(())
            }
            State::Uncommitted if self.streaming => {
                Err(Error::InvalidState("output stream already opened"))
            }
            State::Uncommitted => Err(Error::InvalidState(
                "cannot open output stream after data was copied in",
            )),
            State::Committed => Err(Error::InvalidState("blob already committed")),
        }
    }

    pub fn begin_read_from(&mut self, commit: bool) -> Result<()> {
        match self.state {
            State::Committed => Err(Error::InvalidState("blob already committed")),
            State::Uncommitted if commit && self.streaming => Err(Error::InvalidState(
                "cannot commit while an output stream is in use",
            )),
            State::New | State::Uncommitted => {
                self.state = State::Uncommitted;
                Ok(())
            }
        }
    }

    pub fn check_writable(&self) -> Result<()> {
        match self.state {
            State::Uncommitted => Ok(()),
            State::New => Err(Error::InvalidState("no output stream opened")),
            State::Committed => Err(Error::InvalidState("write after commit")),
        }
    }

    pub fn commit(&mut self) -> Result<()> {
        match self.state {
            State::Committed => Err(Error::InvalidState("blob already committed")),
            State::New | State::Uncommitted => {
                self.state = State::Committed;
                self.streaming = false;
                Ok(())
            }
        }
    }

    pub fn check_readable(&self, uncommitted: bool) -> Result<()> {
        match self.state {
            State::Committed => Ok(()),
            State::Uncommitted if uncommitted => Ok(()),
            State::Uncommitted => Err(Error::InvalidState("blob not yet committed")),
            State::New => Err(Error::InvalidState("nothing has been written")),
        }
    }
}

#[test]
fn output_stream_then_commit() {
    let mut lifecycle = Lifecycle::default();
    assert!(lifecycle.open_output_stream().is_ok());
    assert!(lifecycle.open_output_stream().is_err());
    assert!(lifecycle.begin_read_from(true).is_err());
    assert!(lifecycle.begin_read_from(false).is_ok());
    assert!(lifecycle.commit().is_ok());
    assert_eq!(lifecycle.state(), State::Committed);
    assert!(lifecycle.check_writable().is_err());
    assert!(lifecycle.begin_read_from(false).is_err());
}

#[test]
fn readable_depends_on_capability() {
    let mut lifecycle = Lifecycle::default();
    assert!(lifecycle.check_readable(true).is_err());
    lifecycle.begin_read_from(false).unwrap();
    assert!(lifecycle.check_readable(true).is_ok());
    assert!(lifecycle.check_readable(false).is_err());
    lifecycle.commit().unwrap();
    assert!(lifecycle.check_readable(false).is_ok());
}
