//! Mock stream for injecting std::io failures;
use mockall::mock;

use std::io::{self, Read, Write};

mock! {
    pub Stream {}
    impl Read for Stream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    }
    impl Write for Stream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }
}
