//! Process exit codes, kept alongside the envelope since every CLI command
//! derives one from its own `Envelope::exit_code` byte.

/// Mirrors `Envelope::exit_code` as a typed enum for `main()`'s final
/// `std::process::exit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    Error = 2,
}

impl From<u8> for ExitCode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::NotFound,
            _ => Self::Error,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(value: ExitCode) -> Self {
        value as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::from(0u8)), 0);
        assert_eq!(i32::from(ExitCode::from(1u8)), 1);
        assert_eq!(i32::from(ExitCode::from(200u8)), 2);
    }
}
