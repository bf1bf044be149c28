mod bot_admin_messages;
mod bot_callback;
mod bot_messages;
mod callback;
mod commands;
mod gate;
mod keyboards;

// callback payload is {flag} or {flag}:{id}
const REGIONS_FLAG: &str = "regions";
const REGION_FLAG: &str = "region";
const DISTRICT_FLAG: &str = "district";
const CHECK_SUBSCRIBE_FLAG: &str = "checksub";

const SOMETHING_WRONG_MSG: &str = "Something went wrong, try again later";

pub use bot_admin_messages::admin_command_handler;
pub use bot_callback::callback_handler;
pub use bot_messages::{command_handler, message_handler};
pub use commands::{AdminCommand, Command};

/// Types that travel through callback-button payloads as plain strings
pub(crate) trait PayloadData: Sized {
    type Error;

    fn to_payload(&self) -> String;
    fn try_from_payload(payload: &str) -> Result<Self, Self::Error>;
}
