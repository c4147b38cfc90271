pub mod contact;
pub mod content;
pub mod kindergarten;
pub mod site;
pub mod user;

pub use contact::ContactSubmission;
pub use content::{Announcement, CoreEducationProgram, Event, GalleryImage, ParentTestimonial, Staff};
pub use kindergarten::Kindergarten;
pub use site::{AboutUsContent, GeneralSettings, MissionVision};
pub use user::{User, UserListing};
