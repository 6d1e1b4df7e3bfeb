pub mod localize;
pub mod logging;
pub mod manifest;
pub mod path_safety;
pub mod progress;
pub mod report;
pub mod run;
pub mod verify;
