pub mod favorite;
pub mod inquiry;
pub mod listing;
pub mod material;
pub mod user;

pub use favorite::{FavoriteRepository, FavoriteRepositoryTrait};
pub use inquiry::{InquiryRepository, InquiryRepositoryTrait};
pub use listing::{ListingFilter, ListingRepository, ListingRepositoryTrait, NewListing, ListingPatch};
pub use material::{MaterialRepository, MaterialRepositoryTrait};
pub use user::{UserPatch, UserRepository, UserRepositoryTrait};

#[cfg(test)]
pub use favorite::MockFavoriteRepositoryTrait;
#[cfg(test)]
pub use inquiry::MockInquiryRepositoryTrait;
#[cfg(test)]
pub use listing::MockListingRepositoryTrait;
#[cfg(test)]
pub use material::MockMaterialRepositoryTrait;
#[cfg(test)]
pub use user::MockUserRepositoryTrait;
