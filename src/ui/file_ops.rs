//! File and storage-service operations.
//!
//! This module handles local template file I/O (native file dialogs and
//! WASM-compatible browser operations) and the asynchronous calls to the
//! remote template storage service. Both report back over channels drained
//! once per frame, so the UI thread never blocks on a dialog or a request,
//! and local state only changes after an operation confirms.

use super::state::{
    EditorApp, FileOperationResult, PendingLoadOperation, PendingSaveOperation,
    StoreOperationResult, UploadTarget,
};
use crate::storage::StoreClient;
use crate::types::{ElementPayload, Template};
use eframe::egui;

#[cfg(not(target_arch = "wasm32"))]
fn spawn_task(future: impl std::future::Future<Output = ()> + Send + 'static) {
    tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn_task(future: impl std::future::Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(future);
}

impl EditorApp {
    /// Handles pending local file operations for both native and WASM
    /// platforms.
    ///
    /// Processes completed async file operations from the channel and
    /// initiates newly requested ones.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        // First, process any completed file operations from the channel
        let completed: Vec<FileOperationResult> = match &self.file.file_operation_receiver {
            Some(receiver) => receiver.try_iter().collect(),
            None => Vec::new(),
        };
        {
            for result in completed {
                match result {
                    FileOperationResult::SaveCompleted(path) => {
                        self.file.current_path = Some(path);
                        self.file.has_unsaved_changes = false;
                        self.store.status = Some("Template saved".to_string());
                    }
                    FileOperationResult::LoadCompleted(path, content) => {
                        match Template::from_json(&content) {
                            Ok(template) => {
                                self.install_template(template);
                                self.file.current_path = Some(path);
                                self.store.remote_id = None;
                                self.store.status = Some("Template loaded".to_string());
                            }
                            Err(e) => {
                                // Malformed payloads never partially apply
                                log::warn!("failed to parse template file: {e}");
                                self.store.status =
                                    Some(format!("Failed to parse template: {e}"));
                            }
                        }
                    }
                    FileOperationResult::OperationFailed(error) => {
                        log::warn!("file operation failed: {error}");
                        self.store.status = Some(format!("File operation failed: {error}"));
                    }
                }
            }
        }

        // Handle pending save operations
        if let Some(save_op) = self.file.pending_save_operation.take() {
            let ctx = ctx.clone();
            let template_json = self.template.to_json().unwrap_or_default();
            let sender = self.file.file_operation_sender.clone();

            match save_op {
                PendingSaveOperation::SaveAs => {
                    #[cfg(target_arch = "wasm32")]
                    {
                        // Use synchronous download for Firefox compatibility
                        match Self::trigger_download("template.json", &template_json) {
                            Ok(_) => {
                                if let Some(tx) = sender {
                                    let _ = tx.send(FileOperationResult::SaveCompleted(
                                        "template.json".to_string(),
                                    ));
                                }
                            }
                            Err(e) => {
                                if let Some(tx) = sender {
                                    let _ = tx.send(FileOperationResult::OperationFailed(e));
                                }
                            }
                        }
                        ctx.request_repaint();
                    }

                    #[cfg(not(target_arch = "wasm32"))]
                    {
                        spawn_task(async move {
                            if let Some(handle) = rfd::AsyncFileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("template.json")
                                .save_file()
                                .await
                            {
                                let path = handle.path();
                                match std::fs::write(path, template_json) {
                                    Ok(_) => {
                                        if let Some(tx) = sender {
                                            let _ = tx.send(FileOperationResult::SaveCompleted(
                                                path.display().to_string(),
                                            ));
                                        }
                                    }
                                    Err(e) => {
                                        if let Some(tx) = sender {
                                            let _ =
                                                tx.send(FileOperationResult::OperationFailed(
                                                    format!("Failed to save file: {}", e),
                                                ));
                                        }
                                    }
                                }
                            }
                            ctx.request_repaint();
                        });
                    }
                }
                PendingSaveOperation::Save => {
                    if let Some(path) = self.file.current_path.clone() {
                        #[cfg(not(target_arch = "wasm32"))]
                        {
                            spawn_task(async move {
                                match std::fs::write(&path, template_json) {
                                    Ok(_) => {
                                        if let Some(tx) = sender {
                                            let _ =
                                                tx.send(FileOperationResult::SaveCompleted(path));
                                        }
                                    }
                                    Err(e) => {
                                        if let Some(tx) = sender {
                                            let _ =
                                                tx.send(FileOperationResult::OperationFailed(
                                                    format!("Failed to save file: {}", e),
                                                ));
                                        }
                                    }
                                }
                                ctx.request_repaint();
                            });
                        }

                        #[cfg(target_arch = "wasm32")]
                        {
                            // For WASM, we can't "save" to a previous path without
                            // user interaction. Fall back to Save As.
                            self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
                        }
                    } else {
                        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
                    }
                }
            }
        }

        // Handle pending load operations
        if let Some(_load_op) = self.file.pending_load_operation.take() {
            let ctx = ctx.clone();
            let sender = self.file.file_operation_sender.clone();

            spawn_task(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                    .await
                {
                    let name = handle.file_name();
                    let bytes = handle.read().await;
                    match String::from_utf8(bytes) {
                        Ok(json) => {
                            if let Some(tx) = sender {
                                let _ = tx.send(FileOperationResult::LoadCompleted(name, json));
                            }
                        }
                        Err(_) => {
                            if let Some(tx) = sender {
                                let _ = tx.send(FileOperationResult::OperationFailed(
                                    "File is not valid UTF-8".to_string(),
                                ));
                            }
                        }
                    }
                }
                ctx.request_repaint();
            });
        }
    }

    /// Triggers a file download in the browser (WASM only,
    /// Firefox-compatible).
    #[cfg(target_arch = "wasm32")]
    pub(super) fn trigger_download(filename: &str, content: &str) -> Result<(), String> {
        use wasm_bindgen::JsCast;

        let window = web_sys::window().ok_or("No window found")?;
        let document = window.document().ok_or("No document found")?;

        // Create a Blob containing the file content
        let blob_parts = js_sys::Array::new();
        blob_parts.push(&wasm_bindgen::JsValue::from_str(content));

        let mut blob_options = web_sys::BlobPropertyBag::new();
        blob_options.type_("application/json");

        let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)
            .map_err(|_| "Failed to create blob")?;

        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Failed to create object URL")?;

        let anchor = document
            .create_element("a")
            .map_err(|_| "Failed to create anchor element")?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "Failed to cast to anchor element")?;

        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        document
            .body()
            .ok_or("No body found")?
            .append_child(&anchor)
            .map_err(|_| "Failed to append anchor")?;

        anchor.click();

        document
            .body()
            .ok_or("No body found")?
            .remove_child(&anchor)
            .map_err(|_| "Failed to remove anchor")?;

        web_sys::Url::revoke_object_url(&url).map_err(|_| "Failed to revoke object URL")?;

        Ok(())
    }

    /// Opens a file dialog to save the template with a new name.
    pub fn save_as_template(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
    }

    /// Saves the template to the current file path, or triggers "Save As" if
    /// no path is set.
    pub fn save_template_file(&mut self) {
        if self.file.current_path.is_some() {
            self.file.pending_save_operation = Some(PendingSaveOperation::Save);
        } else {
            self.save_as_template();
        }
    }

    /// Opens a file dialog to load a template from disk or the browser.
    pub fn load_template_file(&mut self) {
        self.file.pending_load_operation = Some(PendingLoadOperation::Load);
    }

    // ---- Remote storage service ----

    /// Drains completed storage operations and applies their results.
    ///
    /// Local state changes only here, after the service has confirmed the
    /// operation; a failure leaves everything untouched apart from the
    /// status line.
    pub fn handle_store_results(&mut self, ctx: &egui::Context) {
        let Some(receiver) = self.store.receiver.take() else {
            return;
        };

        while let Ok(result) = receiver.try_recv() {
            self.store.busy = false;
            match result {
                StoreOperationResult::Saved(id) => {
                    self.store.status = Some(format!("Saved to server as {id}"));
                    self.store.remote_id = Some(id);
                    self.file.has_unsaved_changes = false;
                }
                StoreOperationResult::Updated(id) => {
                    self.store.status = Some(format!("Updated {id}"));
                    self.file.has_unsaved_changes = false;
                }
                StoreOperationResult::Loaded(record) => {
                    let id = record.id.clone();
                    let template = record.into_template();
                    if template.config.width <= 0.0 || template.config.height <= 0.0 {
                        self.store.status =
                            Some("Stored template has an invalid canvas size".to_string());
                    } else {
                        self.install_template(template);
                        self.store.remote_id = Some(id);
                        self.store.status = Some("Template loaded from server".to_string());
                    }
                }
                StoreOperationResult::Deleted(id) => {
                    // Deletion was confirmed by the server; now it is safe to
                    // drop locally
                    self.store.templates.retain(|summary| summary.id != id);
                    if self.store.remote_id.as_deref() == Some(id.as_str()) {
                        self.store.remote_id = None;
                    }
                    self.store.status = Some(format!("Deleted {id}"));
                }
                StoreOperationResult::Listed(templates) => {
                    self.store.templates = templates;
                }
                StoreOperationResult::Uploaded(target, url) => {
                    self.apply_uploaded_url(target, url, ctx);
                }
                StoreOperationResult::Failed(message) => {
                    log::warn!("storage operation failed: {message}");
                    self.store.status = Some(message);
                }
            }
        }

        self.store.receiver = Some(receiver);
    }

    fn apply_uploaded_url(&mut self, target: UploadTarget, url: String, ctx: &egui::Context) {
        match target {
            UploadTarget::Background => {
                let old_config = self.template.config.clone();
                self.template.config.background_image = url.clone();
                self.undo_history
                    .push_config_change(old_config, self.template.config.clone());
            }
            UploadTarget::ElementSrc(id) => {
                if let Some(element) = self.template.element_mut(&id) {
                    let old_element = element.clone();
                    if let ElementPayload::Image(image) = &mut element.payload {
                        image.src = url.clone();
                    }
                    let new_element = self.template.element(&id).cloned();
                    if let Some(new_element) = new_element {
                        self.undo_history
                            .push_property_change(id, old_element, new_element);
                    }
                }
            }
        }
        self.file.has_unsaved_changes = true;
        self.store.status = Some("Image uploaded".to_string());
        self.images.ensure(&url, ctx);
    }

    fn store_client(&self) -> StoreClient {
        StoreClient::new(self.store.base_url.clone())
    }

    /// Saves (or updates) the template on the storage service.
    ///
    /// An empty template name is a validation error: it is reported inline
    /// and nothing is sent.
    pub fn store_save(&mut self, ctx: &egui::Context) {
        if self.template.name.trim().is_empty() {
            self.store.validation_error = Some("Template name cannot be empty".to_string());
            return;
        }
        self.store.validation_error = None;

        let client = self.store_client();
        let template = self.template.clone();
        let remote_id = self.store.remote_id.clone();
        let Some(sender) = self.store.sender.clone() else {
            return;
        };
        self.store.busy = true;
        let ctx = ctx.clone();

        spawn_task(async move {
            let result = match &remote_id {
                Some(id) => client
                    .update(id, &template)
                    .await
                    .map(|_| StoreOperationResult::Updated(id.clone())),
                None => client
                    .save(&template)
                    .await
                    .map(|saved| StoreOperationResult::Saved(saved.id)),
            };
            let _ = sender.send(result.unwrap_or_else(|e| StoreOperationResult::Failed(
                format!("Save failed: {e}"),
            )));
            ctx.request_repaint();
        });
    }

    /// Fetches a stored template for editing.
    pub fn store_load(&mut self, id: String, ctx: &egui::Context) {
        let client = self.store_client();
        let Some(sender) = self.store.sender.clone() else {
            return;
        };
        self.store.busy = true;
        let ctx = ctx.clone();

        spawn_task(async move {
            let result = match client.get(&id).await {
                Ok(record) => StoreOperationResult::Loaded(Box::new(record)),
                Err(e) => StoreOperationResult::Failed(format!("Load failed: {e}")),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    /// Deletes a stored template. The local list is updated only once the
    /// server confirms.
    pub fn store_delete(&mut self, id: String, ctx: &egui::Context) {
        let client = self.store_client();
        let Some(sender) = self.store.sender.clone() else {
            return;
        };
        self.store.busy = true;
        let ctx = ctx.clone();

        spawn_task(async move {
            let result = match client.delete(&id).await {
                Ok(()) => StoreOperationResult::Deleted(id),
                Err(e) => StoreOperationResult::Failed(format!("Delete failed: {e}")),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    /// Refreshes the stored template listing.
    pub fn store_refresh_list(&mut self, ctx: &egui::Context) {
        let client = self.store_client();
        let Some(sender) = self.store.sender.clone() else {
            return;
        };
        self.store.busy = true;
        let ctx = ctx.clone();

        spawn_task(async move {
            let result = match client.list().await {
                Ok(templates) => StoreOperationResult::Listed(templates),
                Err(e) => StoreOperationResult::Failed(format!("List failed: {e}")),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    /// Picks an image file and uploads it, applying the returned URL to the
    /// target once the service confirms.
    pub fn store_upload_image(&mut self, target: UploadTarget, ctx: &egui::Context) {
        let client = self.store_client();
        let Some(sender) = self.store.sender.clone() else {
            return;
        };
        self.store.busy = true;
        let ctx = ctx.clone();

        spawn_task(async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp"])
                .pick_file()
                .await
            else {
                let _ = sender.send(StoreOperationResult::Failed(
                    "Upload cancelled".to_string(),
                ));
                ctx.request_repaint();
                return;
            };

            let filename = handle.file_name();
            let bytes = handle.read().await;
            let result = match client.upload(bytes, &filename).await {
                Ok(uploaded) => StoreOperationResult::Uploaded(target, uploaded.url),
                Err(e) => StoreOperationResult::Failed(format!("Upload failed: {e}")),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }
}
