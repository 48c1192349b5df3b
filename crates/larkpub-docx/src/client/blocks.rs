//! Block operations for the docx API.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::DocxClient;
use super::transport::ApiRequest;
use crate::error::LarkError;
use crate::types::{Block, BlockType, ChildrenPage, TextRun};

/// Revision selector meaning "latest".
const LATEST_REVISION: &str = "-1";

#[derive(Deserialize)]
struct CreatedChildren {
    #[serde(default)]
    children: Vec<CreatedChild>,
}

#[derive(Deserialize)]
struct CreatedChild {
    block_id: String,
}

impl DocxClient<'_> {
    /// List one page of a block's children.
    pub fn list_children(
        &self,
        document_id: &str,
        block_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<ChildrenPage, LarkError> {
        let url = format!("{}/children", self.client.blocks_url(document_id, block_id));
        let mut request = ApiRequest::get(url)
            .query("document_revision_id", LATEST_REVISION)
            .query("page_size", page_size.to_string());
        if let Some(token) = page_token {
            request = request.query("page_token", token);
        }

        let data = self.execute(request)?;
        let page: ChildrenPage = if data.is_null() {
            ChildrenPage::default()
        } else {
            serde_json::from_value(data)?
        };

        debug!(
            document_id,
            block_id,
            count = page.items.len(),
            has_more = page.has_more,
            "Listed children"
        );
        Ok(page)
    }

    /// List every child of a block, following page tokens.
    ///
    /// Read-only; used for dumps and dry runs.
    pub fn list_all_children(
        &self,
        document_id: &str,
        block_id: &str,
        page_size: u32,
    ) -> Result<Vec<Block>, LarkError> {
        let mut blocks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_children(document_id, block_id, page_token.as_deref(), page_size)?;
            blocks.extend(page.items);

            match page.page_token {
                Some(token) if page.has_more && !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(blocks)
    }

    /// Delete children `[start, end)` of a block.
    ///
    /// # Errors
    ///
    /// Returns [`LarkError::InvalidRequest`] without sending anything when the
    /// range is empty.
    pub fn delete_children_range(
        &self,
        document_id: &str,
        block_id: &str,
        start: usize,
        end: usize,
    ) -> Result<(), LarkError> {
        if start >= end {
            return Err(LarkError::InvalidRequest(format!(
                "empty delete range [{start}, {end})"
            )));
        }

        let url = format!(
            "{}/children/batch_delete",
            self.client.blocks_url(document_id, block_id)
        );
        let request = ApiRequest::delete(url)
            .query("document_revision_id", LATEST_REVISION)
            .json(json!({"start_index": start, "end_index": end}));

        self.execute(request)?;
        info!(document_id, block_id, start, end, "Deleted children");
        Ok(())
    }

    /// Insert a text block built from `runs` at `index` under `parent`.
    ///
    /// Returns the new block ID.
    pub fn create_text_block(
        &self,
        document_id: &str,
        parent: &str,
        index: usize,
        runs: &[TextRun],
    ) -> Result<String, LarkError> {
        let elements: Vec<Value> = runs.iter().map(|run| json!({"text_run": run})).collect();
        let child = json!({
            "block_type": u32::from(BlockType::Text),
            "text": {"elements": elements},
        });
        self.create_child(document_id, parent, index, child)
    }

    /// Insert an empty image block at `index` under `parent`.
    ///
    /// Returns the new block ID, used as the upload's parent node.
    pub fn create_image_placeholder(
        &self,
        document_id: &str,
        parent: &str,
        index: usize,
    ) -> Result<String, LarkError> {
        let child = json!({
            "block_type": u32::from(BlockType::Image),
            "image": {"token": ""},
        });
        self.create_child(document_id, parent, index, child)
    }

    fn create_child(
        &self,
        document_id: &str,
        parent: &str,
        index: usize,
        child: Value,
    ) -> Result<String, LarkError> {
        let url = format!("{}/children", self.client.blocks_url(document_id, parent));
        let request = ApiRequest::post(url).json(json!({
            "index": index,
            "children": [child],
        }));

        let data = self.execute(request)?;
        let created: CreatedChildren = if data.is_null() {
            CreatedChildren {
                children: Vec::new(),
            }
        } else {
            serde_json::from_value(data)?
        };

        let block_id = created
            .children
            .into_iter()
            .next()
            .map(|c| c.block_id)
            .ok_or_else(|| {
                LarkError::WorkflowStep(format!(
                    "creating a child of {parent} returned no children"
                ))
            })?;

        debug!(document_id, parent, index, block_id = %block_id, "Created block");
        Ok(block_id)
    }
}
