pub mod content;
pub mod fields;
pub mod page;
pub mod shop;
pub mod timeline;
pub mod video;

pub use content::{Article, Magazine, Monologue, ResearchPaper};
pub use page::{ListResponse, Pagination};
pub use shop::ShopItem;
pub use timeline::{TimelineEntry, TimelineMeta};
pub use video::VideoLink;
