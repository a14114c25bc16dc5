// Blocking TCP client for the pigpio daemon

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use super::protocol::{decode_response, encode_request, error_reason, Command, FRAME_LEN};
use crate::pwm::{Gpio, PinMode, PwmError, PwmInterface, PwmOutput};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection to a running pigpiod
pub struct PigpioClient {
    stream: Option<TcpStream>,
    addr: String,
}

impl PigpioClient {
    /// Connect to pigpiod at `host:port`
    pub fn connect(host: &str, port: u16) -> Result<Self, PwmError> {
        let addr = format!("{}:{}", host, port);
        info!("Connecting to pigpio daemon at {}", addr);

        let mut last_err = None;
        for sock in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&sock, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(IO_TIMEOUT))?;
                    stream.set_write_timeout(Some(IO_TIMEOUT))?;
                    return Ok(Self {
                        stream: Some(stream),
                        addr,
                    });
                }
                Err(e) => {
                    debug!("Connect to {} failed: {}", sock, e);
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => PwmError::Io(e),
            None => PwmError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("{} did not resolve to any address", addr),
            )),
        })
    }

    /// Send one command and return its (non-negative) result
    fn command(&mut self, cmd: Command, p1: u32, p2: u32) -> Result<u32, PwmError> {
        let stream = self.stream.as_mut().ok_or(PwmError::NotConnected)?;

        stream.write_all(&encode_request(cmd, p1, p2))?;
        let mut frame = [0u8; FRAME_LEN];
        stream.read_exact(&mut frame)?;

        let (echo, res) = decode_response(&frame);
        if echo != cmd as u32 {
            return Err(PwmError::InvalidResponse {
                command: cmd.name(),
                reason: format!("expected command {}, got {}", cmd as u32, echo),
            });
        }
        if res < 0 {
            return Err(PwmError::Rejected {
                command: cmd.name(),
                gpio: p1,
                code: res,
                reason: error_reason(res),
            });
        }
        Ok(res as u32)
    }

    /// Daemon version number
    pub fn version(&mut self) -> Result<u32, PwmError> {
        self.command(Command::Pigpv, 0, 0)
    }

    pub fn pwm_range(&mut self, gpio: Gpio) -> Result<u32, PwmError> {
        self.command(Command::Prg, gpio, 0)
    }

    pub fn pwm_frequency(&mut self, gpio: Gpio) -> Result<u32, PwmError> {
        self.command(Command::Pfg, gpio, 0)
    }
}

impl PwmOutput for PigpioClient {
    fn set_duty_cycle(&mut self, gpio: Gpio, duty: u32) -> Result<(), PwmError> {
        self.command(Command::Pwm, gpio, duty).map(|_| ())
    }
}

impl PwmInterface for PigpioClient {
    fn check_connection(&mut self) -> Result<(), PwmError> {
        let version = self.version()?;
        debug!("pigpio daemon version {}", version);
        Ok(())
    }

    fn set_mode(&mut self, gpio: Gpio, mode: PinMode) -> Result<(), PwmError> {
        self.command(Command::Modes, gpio, mode as u32).map(|_| ())
    }

    fn set_pwm_range(&mut self, gpio: Gpio, range: u32) -> Result<u32, PwmError> {
        self.command(Command::Prs, gpio, range)
    }

    fn set_pwm_frequency(&mut self, gpio: Gpio, hz: u32) -> Result<u32, PwmError> {
        self.command(Command::Pfs, gpio, hz)
    }

    fn duty_cycle(&mut self, gpio: Gpio) -> Result<u32, PwmError> {
        self.command(Command::Gdc, gpio, 0)
    }

    fn close(&mut self) -> Result<(), PwmError> {
        let stream = self.stream.take().ok_or(PwmError::NotConnected)?;
        info!("Closing pigpio connection to {}", self.addr);
        match stream.shutdown(Shutdown::Both) {
            // Daemon already hung up
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other.map_err(PwmError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Fake daemon: answers each request with the given results in order
    fn fake_daemon(results: Vec<i32>) -> (u16, thread::JoinHandle<Vec<[u8; FRAME_LEN]>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut requests = Vec::new();
            for res in results {
                let mut frame = [0u8; FRAME_LEN];
                if sock.read_exact(&mut frame).is_err() {
                    break;
                }
                requests.push(frame);
                frame[12..16].copy_from_slice(&res.to_le_bytes());
                sock.write_all(&frame).unwrap();
            }
            requests
        });
        (port, handle)
    }

    #[test]
    fn test_set_duty_cycle_round_trip() {
        let (port, daemon) = fake_daemon(vec![0]);
        let mut client = PigpioClient::connect("127.0.0.1", port).unwrap();
        client.set_duty_cycle(8, 200).unwrap();
        drop(client);

        let requests = daemon.join().unwrap();
        assert_eq!(requests[0], encode_request(Command::Pwm, 8, 200));
    }

    #[test]
    fn test_frequency_returns_actual() {
        let (port, daemon) = fake_daemon(vec![800]);
        let mut client = PigpioClient::connect("127.0.0.1", port).unwrap();
        assert_eq!(client.set_pwm_frequency(5, 1000).unwrap(), 800);
        drop(client);
        daemon.join().unwrap();
    }

    #[test]
    fn test_negative_result_is_rejected() {
        let (port, daemon) = fake_daemon(vec![-8]);
        let mut client = PigpioClient::connect("127.0.0.1", port).unwrap();
        let err = client.set_duty_cycle(5, 999).unwrap_err();
        match err {
            PwmError::Rejected { code, gpio, .. } => {
                assert_eq!(code, -8);
                assert_eq!(gpio, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        drop(client);
        daemon.join().unwrap();
    }

    #[test]
    fn test_closed_client_not_connected() {
        let (port, daemon) = fake_daemon(vec![]);
        let mut client = PigpioClient::connect("127.0.0.1", port).unwrap();
        client.close().unwrap();
        assert!(matches!(
            client.set_duty_cycle(5, 0),
            Err(PwmError::NotConnected)
        ));
        daemon.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(PigpioClient::connect("127.0.0.1", port).is_err());
    }
}
