use super::buffer::PacketBuffer;
use crate::error::Result;

/// A section of a DNS message that knows its own wire layout.
pub trait PacketComponent {
    fn write(&self, buffer: &mut PacketBuffer) -> Result<()>;

    fn read(&mut self, buffer: &mut PacketBuffer) -> Result<()>;
}
