// pigpio daemon socket protocol
//
// Request:  [cmd, p1, p2, p3] as four little-endian u32 (16 bytes)
// Response: 16 bytes, cmd echoed in the first word, signed result in the last.
// A negative result is an error code.

/// Size of a request or response frame
pub const FRAME_LEN: usize = 16;

/// Commands understood by pigpiod (subset used here)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Modes = 0,
    Pwm = 5,
    Prs = 6,
    Pfs = 7,
    Prg = 22,
    Pfg = 23,
    Pigpv = 26,
    Gdc = 83,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Modes => "set_mode",
            Command::Pwm => "set_PWM_dutycycle",
            Command::Prs => "set_PWM_range",
            Command::Pfs => "set_PWM_frequency",
            Command::Prg => "get_PWM_range",
            Command::Pfg => "get_PWM_frequency",
            Command::Pigpv => "get_pigpio_version",
            Command::Gdc => "get_PWM_dutycycle",
        }
    }
}

/// Build a request frame
pub fn encode_request(cmd: Command, p1: u32, p2: u32) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0..4].copy_from_slice(&(cmd as u32).to_le_bytes());
    frame[4..8].copy_from_slice(&p1.to_le_bytes());
    frame[8..12].copy_from_slice(&p2.to_le_bytes());
    // p3 (extension length) is always 0 for the commands we send
    frame
}

/// Split a response frame into (echoed command, result)
pub fn decode_response(frame: &[u8; FRAME_LEN]) -> (u32, i32) {
    let cmd = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
    let res = i32::from_le_bytes([frame[12], frame[13], frame[14], frame[15]]);
    (cmd, res)
}

/// Human-readable meaning of a pigpio error code
pub fn error_reason(code: i32) -> &'static str {
    match code {
        -1 => "initialisation failed",
        -2 => "GPIO not 0-31",
        -3 => "GPIO not 0-53",
        -4 => "mode not 0-7",
        -5 => "level not 0-1",
        -8 => "dutycycle outside set range",
        -21 => "dutyrange not 25-40000",
        -41 => "GPIO operation not permitted",
        -92 => "GPIO is not in use for PWM",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_set_dutycycle() {
        let frame = encode_request(Command::Pwm, 8, 187);
        assert_eq!(
            frame,
            [5, 0, 0, 0, 8, 0, 0, 0, 187, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_encode_large_param() {
        let frame = encode_request(Command::Pfs, 5, 1000);
        assert_eq!(&frame[8..12], &[0xE8, 0x03, 0, 0]);
    }

    #[test]
    fn test_decode_ok() {
        let mut frame = encode_request(Command::Pfs, 5, 1000);
        frame[12..16].copy_from_slice(&1000i32.to_le_bytes());
        assert_eq!(decode_response(&frame), (7, 1000));
    }

    #[test]
    fn test_decode_error_code() {
        let mut frame = encode_request(Command::Pwm, 40, 10);
        frame[12..16].copy_from_slice(&(-2i32).to_le_bytes());
        let (cmd, res) = decode_response(&frame);
        assert_eq!(cmd, Command::Pwm as u32);
        assert_eq!(res, -2);
        assert_eq!(error_reason(res), "GPIO not 0-31");
    }
}
