/// Unix timestamp in seconds, as stored in the db
pub type UnixDateTime = i64;

pub struct DateTime;

impl DateTime {
    pub fn now() -> UnixDateTime {
        chrono::Utc::now().timestamp()
    }
}
