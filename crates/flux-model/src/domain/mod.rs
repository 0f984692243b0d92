mod job_id;
pub use job_id::JobId;

mod errno;
pub use errno::Errno;

mod cred;
pub use cred::{Cred, RoleMask};

mod priority;
pub use priority::Priority;

mod flags;
pub use flags::SubmitFlags;

mod job_entry;
pub use job_entry::JobEntry;

mod job_query;
pub use job_query::JobQuery;

/// Numeric user identifier, as stamped on requests by the connection.
pub type UserId = u32;
