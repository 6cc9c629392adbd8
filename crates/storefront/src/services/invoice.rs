//! Invoice rendering.
//!
//! Invoices are rendered once, after an order commits, and written to the
//! invoice directory as `{order_number}_invoice.html`.

use std::path::{Path, PathBuf};

use askama::Template;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::InvoiceConfig;
use crate::models::OrderWithLines;

#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoiceHtml<'a> {
    order: &'a OrderWithLines,
    sellers: Vec<&'a str>,
    gst_number: &'a str,
}

/// Errors that can occur while rendering an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to write invoice: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a rendered invoice can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRef {
    pub path: PathBuf,
}

/// Produces an invoice document for a placed order. Never touches domain
/// state.
#[async_trait]
pub trait InvoiceRenderer: Send + Sync {
    /// Render `order` and return where the document was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the document could not be produced.
    async fn render(&self, order: &OrderWithLines) -> Result<InvoiceRef, InvoiceError>;
}

/// Writes HTML invoices to a directory.
#[derive(Debug, Clone)]
pub struct HtmlInvoiceRenderer {
    dir: PathBuf,
    gst_number: String,
}

impl HtmlInvoiceRenderer {
    #[must_use]
    pub fn new(config: &InvoiceConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            gst_number: config.gst_number.clone(),
        }
    }

    /// Render the invoice body without writing it anywhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_html(&self, order: &OrderWithLines) -> Result<String, InvoiceError> {
        let html = InvoiceHtml {
            order,
            sellers: order.sellers(),
            gst_number: &self.gst_number,
        }
        .render()?;
        Ok(html)
    }

    fn path_for(&self, order: &OrderWithLines) -> PathBuf {
        self.dir
            .join(format!("{}_invoice.html", order.order.order_number))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl InvoiceRenderer for HtmlInvoiceRenderer {
    async fn render(&self, order: &OrderWithLines) -> Result<InvoiceRef, InvoiceError> {
        let html = self.render_html(order)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(order);
        tokio::fs::write(&path, html).await?;
        tracing::debug!(order_number = %order.order.order_number, path = %path.display(), "Invoice written");
        Ok(InvoiceRef { path })
    }
}
