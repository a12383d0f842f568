/*
 * SPDX-License-Identifier: MIT
 */

//! Main eframe::App implementation.
//!
//! The upload worker runs on its own thread and pushes its outcome into
//! `completed_queue`; `update` drains the queue once per frame and keeps
//! repainting while an upload is in flight.

use std::sync::{Arc, Mutex};

use eframe::egui;

use crate::model::{self, AppState, SelectedFile, UploadState};
use crate::ocr::OcrClient;

/// Dropzone colors per visual state. Plain data, picked at render time;
/// a rejected hover only changes these, it never touches app state.
#[derive(Clone, Copy)]
struct DropzoneStyle {
    fill: egui::Color32,
    stroke: egui::Color32,
    text: egui::Color32,
}

const STYLE_BASE: DropzoneStyle = DropzoneStyle {
    fill: egui::Color32::from_rgb(0x2b, 0x2b, 0x2b),
    stroke: egui::Color32::from_rgb(0x55, 0x55, 0x55),
    text: egui::Color32::from_rgb(0xbd, 0xbd, 0xbd),
};

const STYLE_ACCEPT: DropzoneStyle = DropzoneStyle {
    fill: egui::Color32::from_rgb(0x2b, 0x2b, 0x2b),
    stroke: egui::Color32::from_rgb(0x00, 0xe6, 0x76),
    text: egui::Color32::from_rgb(0xbd, 0xbd, 0xbd),
};

const STYLE_REJECT: DropzoneStyle = DropzoneStyle {
    fill: egui::Color32::from_rgb(0x2b, 0x2b, 0x2b),
    stroke: egui::Color32::from_rgb(0xff, 0x17, 0x44),
    text: egui::Color32::from_rgb(0xbd, 0xbd, 0xbd),
};

#[derive(Clone, Copy, PartialEq)]
enum DragStatus {
    Idle,
    Accept,
    Reject,
}

pub struct DropzoneApp {
    state: AppState,
    /// The upload worker pushes its outcome here
    completed_queue: Arc<Mutex<Vec<Result<String, String>>>>,
    client: Arc<OcrClient>,
    /// One texture per selected file, rebuilt whenever the selection is
    /// replaced. Dropping a handle releases the texture.
    previews: Vec<Option<egui::TextureHandle>>,
    /// Scratch buffer behind the result text area; edits stay here and
    /// never flow back into the stored result.
    result_edit: String,
}

impl DropzoneApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            state: AppState::new(),
            completed_queue: Arc::new(Mutex::new(Vec::new())),
            client: Arc::new(OcrClient::new()),
            previews: Vec::new(),
            result_edit: String::new(),
        }
    }

    /// Drain completed uploads (called each frame).
    fn poll_results(&mut self) {
        let outcomes: Vec<Result<String, String>> = {
            let mut completed = self.completed_queue.lock().unwrap();
            completed.drain(..).collect()
        };
        if outcomes.is_empty() {
            return;
        }

        for outcome in outcomes {
            self.state.finish_upload(outcome);
        }

        self.result_edit = self.state.result_text().unwrap_or_default().to_string();
        if let Some(status) = outcome_status(&self.state.upload) {
            self.state.status_message = status;
        }
    }

    /// Accept a drag-and-drop: keep the images, ignore the rest. A drop
    /// with no image in it changes nothing.
    fn accept_dropped(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let mut accepted = Vec::new();
        for file in &dropped {
            let name = dropped_file_name(file);
            if !model::is_image_name(&name) {
                log::debug!("Ignoring non-image drop: {name}");
                continue;
            }
            let Some(bytes) = read_dropped_file(file) else {
                continue;
            };
            accepted.push(SelectedFile {
                mime: model::detect_mime(&name).into(),
                name,
                bytes,
            });
        }

        if !accepted.is_empty() {
            self.replace_selection(ctx, accepted);
        }
    }

    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", model::IMAGE_EXTENSIONS)
            .pick_files()
        else {
            return;
        };

        let mut accepted = Vec::new();
        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image")
                .to_string();
            if !model::is_image_name(&name) {
                continue;
            }
            match std::fs::read(&path) {
                Ok(bytes) => accepted.push(SelectedFile {
                    mime: model::detect_mime(&name).into(),
                    name,
                    bytes,
                }),
                Err(e) => log::error!("Failed to read {}: {e}", path.display()),
            }
        }

        if !accepted.is_empty() {
            self.replace_selection(ctx, accepted);
        }
    }

    /// Swap in a new selection and rebuild its preview textures. The old
    /// handles drop first, so previous previews are released on every
    /// replacement path.
    fn replace_selection(&mut self, ctx: &egui::Context, files: Vec<SelectedFile>) {
        self.previews.clear();
        for file in &files {
            self.previews
                .push(decode_image_to_texture(ctx, &file.name, &file.bytes));
        }
        self.state.status_message = if files.len() == 1 {
            format!("{} selected", files[0].name)
        } else {
            format!("{} images selected", files.len())
        };
        self.state.replace_selection(files);
    }

    /// Hand the first selected file to a worker thread. Preconditions
    /// (empty selection, upload already in flight) surface as status
    /// text; no request is issued for them.
    fn submit(&mut self, ctx: &egui::Context) {
        match self.state.begin_upload() {
            Ok(file) => {
                self.state.status_message = format!("Reading {}...", file.name);
                let client = Arc::clone(&self.client);
                let completed_queue = Arc::clone(&self.completed_queue);
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    let outcome = client.recognize(file).map_err(|e| {
                        log::error!("OCR upload failed: {e}");
                        e.to_string()
                    });
                    completed_queue.lock().unwrap().push(outcome);
                    ctx.request_repaint();
                });
            }
            Err(e) => {
                log::debug!("Submit refused: {e}");
                self.state.status_message = e.to_string();
            }
        }
    }

    fn dropzone_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, status: DragStatus) {
        let style = match status {
            DragStatus::Idle => STYLE_BASE,
            DragStatus::Accept => STYLE_ACCEPT,
            DragStatus::Reject => STYLE_REJECT,
        };

        let mut open_dialog = false;
        egui::Frame::none()
            .fill(style.fill)
            .stroke(egui::Stroke::new(2.0, style.stroke))
            .rounding(egui::Rounding::same(2.0))
            .inner_margin(egui::Margin::same(20.0))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.colored_label(style.text, "Drag 'n' drop an image here");
                    for file in &self.state.files {
                        ui.colored_label(
                            style.text,
                            format!("{} - {} bytes", file.name, file.size()),
                        );
                    }
                    ui.add_space(4.0);
                    if ui.button("Open file dialog").clicked() {
                        open_dialog = true;
                    }
                });
            });

        if open_dialog {
            self.open_file_dialog(ctx);
        }
    }

    fn thumbnails_ui(&self, ui: &mut egui::Ui) {
        if self.state.files.is_empty() {
            return;
        }
        ui.horizontal_wrapped(|ui| {
            for (file, texture) in self.state.files.iter().zip(&self.previews) {
                match texture {
                    Some(texture) => {
                        let [w, h] = texture.size();
                        let scale = 200.0 / h as f32;
                        ui.image(egui::load::SizedTexture::new(
                            texture.id(),
                            egui::vec2(w as f32 * scale, 200.0),
                        ));
                    }
                    None => {
                        ui.colored_label(
                            egui::Color32::GRAY,
                            format!("{} (no preview)", file.name),
                        );
                    }
                }
            }
        });
    }

    fn result_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if self.state.result_text().is_some() {
            ui.add(
                egui::TextEdit::multiline(&mut self.result_edit)
                    .desired_rows(10)
                    .desired_width(f32::INFINITY),
            );
        }

        if let Some(message) = self.state.failure_message() {
            ui.colored_label(egui::Color32::from_rgb(255, 100, 100), message);
        }

        let mut submit = false;
        let mut copy = false;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.state.is_loading(), egui::Button::new("Read image"))
                .clicked()
            {
                submit = true;
            }
            if self.state.result_text().is_some() && ui.button("Copy").clicked() {
                copy = true;
            }
        });

        if copy {
            // Copies the stored result, not the edited scratch buffer.
            if let Some(text) = self.state.result_text() {
                let text = text.to_string();
                ui.output_mut(|o| o.copied_text = text);
            }
        }
        if submit {
            self.submit(ctx);
        }
    }
}

impl eframe::App for DropzoneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_results();

        // Keep repainting while the upload is outstanding
        if self.state.is_loading() {
            ctx.request_repaint();
        }

        self.accept_dropped(ctx);
        let drag_status = drag_status(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.heading("Image OCR");
            ui.horizontal(|ui| {
                if self.state.is_loading() {
                    ui.spinner();
                }
                ui.label(&self.state.status_message);
            });
            ui.add_space(2.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.dropzone_ui(ui, ctx, drag_status);
            ui.add_space(8.0);
            self.thumbnails_ui(ui);
            ui.add_space(8.0);
            self.result_ui(ui, ctx);
        });
    }
}

/// Status line text once an upload settles. On failure this echoes the
/// error label's message so the two indicators never disagree.
fn outcome_status(upload: &UploadState) -> Option<String> {
    match upload {
        UploadState::Succeeded(_) => Some("Text recognized".into()),
        UploadState::Failed(message) => Some(message.clone()),
        _ => None,
    }
}

fn drag_status(ctx: &egui::Context) -> DragStatus {
    ctx.input(|i| {
        if i.raw.hovered_files.is_empty() {
            DragStatus::Idle
        } else if i.raw.hovered_files.iter().all(hovered_is_image) {
            DragStatus::Accept
        } else {
            DragStatus::Reject
        }
    })
}

fn hovered_is_image(file: &egui::HoveredFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    match &file.path {
        Some(path) => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(model::is_image_name)
            .unwrap_or(false),
        // Some platforms report nothing while hovering; keep the zone inviting
        None => true,
    }
}

fn dropped_file_name(file: &egui::DroppedFile) -> String {
    if !file.name.is_empty() {
        return file.name.clone();
    }
    file.path
        .as_ref()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string()
}

fn read_dropped_file(file: &egui::DroppedFile) -> Option<Vec<u8>> {
    if let Some(bytes) = &file.bytes {
        return Some(bytes.to_vec());
    }
    let path = file.path.as_ref()?;
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            None
        }
    }
}

fn decode_image_to_texture(
    ctx: &egui::Context,
    name: &str,
    bytes: &[u8],
) -> Option<egui::TextureHandle> {
    if bytes.is_empty() {
        return None;
    }
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            log::debug!("Preview decode failed for {name}: {e}");
            return None;
        }
    };
    // Downscale for the preview strip
    let thumb = img.thumbnail(480, 480);
    let rgba = thumb.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.into_raw();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
    Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hovered_mime_decides_first() {
        let file = egui::HoveredFile {
            path: Some("notes.txt".into()),
            mime: "image/png".into(),
        };
        assert!(hovered_is_image(&file));
    }

    #[test]
    fn hovered_falls_back_to_extension() {
        let image = egui::HoveredFile {
            path: Some("scan.jpeg".into()),
            mime: String::new(),
        };
        let text = egui::HoveredFile {
            path: Some("notes.txt".into()),
            mime: String::new(),
        };
        assert!(hovered_is_image(&image));
        assert!(!hovered_is_image(&text));
    }

    #[test]
    fn failure_status_echoes_the_error_message() {
        let failed = UploadState::Failed("server returned 500".into());
        assert_eq!(outcome_status(&failed).as_deref(), Some("server returned 500"));
        assert_eq!(outcome_status(&UploadState::Loading), None);
        assert_eq!(outcome_status(&UploadState::Idle), None);
    }

    #[test]
    fn dropped_name_prefers_explicit_name() {
        let file = egui::DroppedFile {
            name: "from-browser.png".into(),
            path: Some("/tmp/other.png".into()),
            ..Default::default()
        };
        assert_eq!(dropped_file_name(&file), "from-browser.png");
    }

    #[test]
    fn dropped_name_falls_back_to_path() {
        let file = egui::DroppedFile {
            path: Some("/tmp/receipt.jpg".into()),
            ..Default::default()
        };
        assert_eq!(dropped_file_name(&file), "receipt.jpg");
    }
}
