pub use self::ctrlc::*;
pub use self::run::*;
pub use self::url::*;

mod ctrlc;
mod run;
mod url;
