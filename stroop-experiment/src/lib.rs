pub mod analysis;
pub mod compose;
pub mod config;
pub mod generator;
pub mod io;
pub mod layout;
pub mod runner;
pub mod scripted;
pub mod session;
pub mod trial;
pub mod trial_log;

pub use analysis::{BlockSummary, BoxStats, FramingComparison, SessionSummary, WelchTest, box_stats, summarize, welch_t_test};
pub use config::{InstructionMode, SessionConfig};
pub use generator::{FixedStimuli, RandomStimuli, StimulusSource, draw_stimulus};
pub use io::{InputEvent, InputSource, Polled, Screen};
pub use layout::{LayoutKind, OptionButton};
pub use runner::{Apparatus, BlockOutcome, BlockRunner, BlockSpec};
pub use scripted::{RecordingScreen, ScriptedInput};
pub use session::{BlockRecord, Session, SessionResultSet};
pub use trial::Trial;
pub use trial_log::{LogError, load_trial_log, read_trial_log, save_trial_log, write_trial_log};
