pub mod block;
pub mod color;
pub mod draw;
pub mod error;
pub mod locale;
pub mod response;
pub mod stimulus;
pub mod trial;

pub use block::{BlockKind, Framing};
pub use color::{Palette, Rgb, Swatch};
pub use draw::{Bounds, DrawCommand, Frame};
pub use error::ExperimentError;
pub use locale::Locale;
pub use response::evaluate;
pub use stimulus::{Congruency, OptionStyle, Stimulus, StimulusPolicy};
pub use trial::{BlockPhase, TrialResult};
