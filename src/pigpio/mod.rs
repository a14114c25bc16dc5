// pigpio daemon backend for the PWM interface
//
// Talks to pigpiod over its socket interface (default port 8888), the same
// daemon the Raspberry Pi pigpio libraries use.

mod client;
pub mod protocol;

pub use client::PigpioClient;
