mod chunks;
mod deltas;

pub use chunks::{Chunks, Error as ChunksError};
pub use deltas::{DeltaLines, Error as DeltaLinesError};
