//! Lark docx data types.

mod block;
mod media;

pub use block::{
    Block, BlockType, ChildrenPage, ImageBody, TextBody, TextElement, TextElementStyle, TextRun,
};
pub use media::FileToken;
