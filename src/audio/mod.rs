pub mod area;
pub mod codec;
pub mod constants;
pub mod interval;
pub mod memory;
pub mod negotiate;
pub mod pump;
pub mod rate;
pub mod stream;
pub mod transfer;

pub use area::ChannelArea;
pub use codec::{FormatSet, SampleFormat, SampleReader, SampleWriter};
pub use interval::Interval;
pub use memory::MemoryTransport;
pub use negotiate::{Constraints, Negotiator};
pub use pump::{PumpReport, StreamPump};
pub use rate::{DstWindow, Method, RateConverter, SrcWindow};
pub use stream::{RateStream, StreamDirection, StreamParams, SwParams};
pub use transfer::{Transport, TransportWindow};
