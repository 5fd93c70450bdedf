pub mod frontend;
pub mod presets;
pub mod sessions;

pub use frontend::*;
pub use presets::*;
pub use sessions::*;
