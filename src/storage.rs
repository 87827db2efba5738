mod filesystem;
mod key;
mod traits;

pub use filesystem::FilesystemDigestStore;
pub use key::RecordKey;
pub use traits::{DigestStore, Fingerprint};
