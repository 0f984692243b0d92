use std::fmt;

use serde::{Deserialize, Serialize};

/// POSIX error number carried by coordinator error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errno(i32);

impl Errno {
    pub const EPERM: Errno = Errno(libc::EPERM);
    pub const ENOENT: Errno = Errno(libc::ENOENT);
    pub const EEXIST: Errno = Errno(libc::EEXIST);
    pub const EINVAL: Errno = Errno(libc::EINVAL);
    pub const ENOSYS: Errno = Errno(libc::ENOSYS);
    pub const EPROTO: Errno = Errno(libc::EPROTO);
    pub const EOVERFLOW: Errno = Errno(libc::EOVERFLOW);
    pub const ECONNRESET: Errno = Errno(libc::ECONNRESET);

    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn code(&self) -> i32 {
        self.0
    }

    /// Short description in the style of `strerror(3)`.
    pub fn describe(&self) -> String {
        let known = match self.0 {
            libc::EPERM => "Operation not permitted",
            libc::ENOENT => "No such file or directory",
            libc::EEXIST => "File exists",
            libc::EINVAL => "Invalid argument",
            libc::ENOSYS => "Function not implemented",
            libc::EPROTO => "Protocol error",
            libc::EOVERFLOW => "Value too large for defined data type",
            libc::ECONNRESET => "Connection reset by peer",
            _ => "",
        };
        if known.is_empty() {
            std::io::Error::from_raw_os_error(self.0).kind().to_string()
        } else {
            known.to_string()
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<i32> for Errno {
    fn from(code: i32) -> Self {
        Self(code)
    }
}
