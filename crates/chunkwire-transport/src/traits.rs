use crate::error::Result;

/// Outbound half of a connection.
///
/// `send` transmits exactly the given bytes, one complete frame per call.
/// Splitting a frame to fit the link MTU (BLE notifications, serial FIFO
/// sizes) is the adapter's job, not the caller's. Implementations may block
/// until the link acknowledges the write.
///
/// The inbound half is not part of this trait: whoever owns the connection
/// delivers received chunks to the session in arrival order.
pub trait Transport {
    /// Transmit one encoded frame.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting(usize);

    impl Transport for Counting {
        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            self.0 += bytes.len();
            Ok(())
        }
    }

    #[test]
    fn mut_ref_forwards() {
        let mut inner = Counting(0);
        {
            let mut by_ref = &mut inner;
            by_ref.send(b"abc").unwrap();
        }
        assert_eq!(inner.0, 3);
    }

    #[test]
    fn boxed_trait_object_forwards() {
        let mut boxed: Box<dyn Transport> = Box::new(Counting(0));
        boxed.send(b"abcd").unwrap();
        boxed.send(b"").unwrap();
    }
}
