/// The receive side of a serial link to the co-processor.
///
/// Mirrors the UART surface of a microcontroller `Stream`: a count of bytes
/// waiting, a consuming read and a non-consuming peek. None of the methods
/// block; a port with nothing waiting reports `0` / `None`.
pub trait SerialPort {
    /// Number of bytes that can be read right now without waiting.
    fn available(&mut self) -> usize;

    /// Remove and return the next waiting byte.
    fn read_byte(&mut self) -> Option<u8>;

    /// Return the next waiting byte without consuming it.
    fn peek_byte(&mut self) -> Option<u8>;
}

impl<P: SerialPort + ?Sized> SerialPort for &mut P {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn peek_byte(&mut self) -> Option<u8> {
        (**self).peek_byte()
    }
}

impl<P: SerialPort + ?Sized> SerialPort for Box<P> {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn peek_byte(&mut self) -> Option<u8> {
        (**self).peek_byte()
    }
}
