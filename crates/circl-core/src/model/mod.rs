mod contact;
mod email_log;
mod interaction;
mod keystone;

#[cfg(test)]
mod tests;

pub use contact::*;
pub use email_log::*;
pub use interaction::*;
pub use keystone::*;
