//! Non-blocking stream abstraction.
//!
//! Platform error codes never escape this boundary: every read or write is
//! normalized into the closed [`IoOutcome`] set, so higher layers never
//! branch on raw `errno` values or `ErrorKind`s.

use std::io::{self, ErrorKind, Read, Write};

/// The normalized result of one non-blocking read or write attempt.
#[derive(Debug)]
pub enum IoOutcome {
    /// The call transferred this many bytes. May be fewer than requested;
    /// the caller resumes from where it left off on the next turn.
    Transferred(usize),
    /// The OS buffer is temporarily full (writes) or empty (reads). Not an
    /// error: work is simply deferred to the next scheduler turn.
    WouldBlock,
    /// The peer performed an orderly shutdown.
    PeerClosed,
}

/// A duplex byte stream driven by an external poll/ready loop.
///
/// Implementations must already be in non-blocking mode; a call does one
/// bounded OS-level transfer and returns. Any `Read + Write` type gets this
/// for free via the blanket impl, which folds `WouldBlock` and `Interrupted`
/// into [`IoOutcome::WouldBlock`] and maps a zero-byte transfer on a
/// non-empty buffer to [`IoOutcome::PeerClosed`].
pub trait WireStream {
    /// Attempt to read into `buf`.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<IoOutcome>;

    /// Attempt to write the bytes of `buf`.
    fn try_write(&mut self, buf: &[u8]) -> io::Result<IoOutcome>;
}

impl<T: Read + Write> WireStream for T {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<IoOutcome> {
        classify(self.read(buf))
    }

    fn try_write(&mut self, buf: &[u8]) -> io::Result<IoOutcome> {
        classify(self.write(buf))
    }
}

fn classify(res: io::Result<usize>) -> io::Result<IoOutcome> {
    match res {
        Ok(0) => Ok(IoOutcome::PeerClosed),
        Ok(n) => Ok(IoOutcome::Transferred(n)),
        Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(IoOutcome::WouldBlock),
        // A signal interrupting the call is retried on the next turn, never
        // inside it: each attempt does one bounded transfer.
        Err(err) if err.kind() == ErrorKind::Interrupted => Ok(IoOutcome::WouldBlock),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Vec<io::Result<usize>>);

    impl Read for Scripted {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.0.remove(0)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.0.remove(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn zero_byte_read_is_peer_closed() {
        let mut s = Scripted(vec![Ok(0)]);
        assert!(matches!(
            s.try_read(&mut [0u8; 4]).unwrap(),
            IoOutcome::PeerClosed
        ));
    }

    #[test]
    fn would_block_and_interrupted_are_control_flow() {
        let mut s = Scripted(vec![
            Err(io::Error::from(ErrorKind::WouldBlock)),
            Err(io::Error::from(ErrorKind::Interrupted)),
        ]);
        assert!(matches!(
            s.try_read(&mut [0u8; 4]).unwrap(),
            IoOutcome::WouldBlock
        ));
        assert!(matches!(s.try_write(&[1]).unwrap(), IoOutcome::WouldBlock));
    }

    #[test]
    fn partial_transfer_reports_count() {
        let mut s = Scripted(vec![Ok(3)]);
        assert!(matches!(
            s.try_write(&[1, 2, 3, 4, 5]).unwrap(),
            IoOutcome::Transferred(3)
        ));
    }

    #[test]
    fn hard_errors_propagate() {
        let mut s = Scripted(vec![Err(io::Error::from(ErrorKind::ConnectionReset))]);
        let err = s.try_read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }
}
