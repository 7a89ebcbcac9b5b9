//! Template management.

use rpctl_api::models::{Template, TemplateParams};
use rpctl_api::RestClient;
use rpctl_retries::{RpctlError, RpctlResult};
use std::sync::Arc;
use tracing::info;

/// Template operations on top of the REST client.
#[derive(Debug, Clone)]
pub struct TemplateService {
    client: Arc<RestClient>,
}

impl TemplateService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List templates, optionally only serverless ones.
    pub async fn list(&self, serverless_only: bool) -> RpctlResult<Vec<Template>> {
        let templates = self.client.list_templates().await?;
        Ok(templates
            .into_iter()
            .filter(|t| !serverless_only || t.is_serverless)
            .collect())
    }

    /// Fetch one template.
    pub async fn get(&self, template_id: &str) -> RpctlResult<Template> {
        self.client.get_template(template_id).await
    }

    /// Create a template.
    pub async fn create(&self, params: &TemplateParams) -> RpctlResult<Template> {
        validate(params)?;
        let template = self.client.create_template(params).await?;
        info!(template_id = %template.id, name = %template.name, "Created template");
        Ok(template)
    }

    /// Replace a template's settings.
    pub async fn update(&self, template_id: &str, params: &TemplateParams) -> RpctlResult<Template> {
        validate(params)?;
        self.client.update_template(template_id, params).await
    }

    /// Delete a template.
    pub async fn delete(&self, template_id: &str) -> RpctlResult<()> {
        self.client.delete_template(template_id).await?;
        info!(template_id, "Deleted template");
        Ok(())
    }
}

fn validate(params: &TemplateParams) -> RpctlResult<()> {
    if params.name.trim().is_empty() {
        return Err(RpctlError::validation("Template name cannot be empty."));
    }
    if params.image_name.trim().is_empty() {
        return Err(RpctlError::validation("--image is required."));
    }
    Ok(())
}
