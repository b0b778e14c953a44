mod scalars;
pub use scalars::ScalarsApp;

mod video;
pub use video::VideoApp;
