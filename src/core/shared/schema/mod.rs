pub mod crm;
pub use self::crm::*;
