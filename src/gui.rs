use chrono::Timelike;
use eframe::egui;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::client::SearchService;
use crate::config::EngineConfig;
use crate::engine::{Completion, Effect, Engine, EngineSnapshot, Key, KeyOutcome, PointerTarget};
use crate::highlight::highlight_or_plain;
use crate::navigator::Navigator;
use crate::surface::spawn_dispatch;
use crate::types::ResultItem;
use crate::visibility::Phase;

/// 弹窗最大高度
const POPUP_MAX_HEIGHT: f32 = 400.0;

pub struct InstantSearchApp {
    engine: Engine,
    query_text: String,
    service: Arc<dyn SearchService>,
    navigator: Arc<dyn Navigator>,
    runtime: tokio::runtime::Handle,
    done_tx: mpsc::UnboundedSender<Completion>,
    done_rx: mpsc::UnboundedReceiver<Completion>,
    // 上一帧的输入框和弹窗区域，用于判断外部点击
    input_rect: Option<egui::Rect>,
    popup_rect: Option<egui::Rect>,
    scroll_to_selected: bool,
    is_dark: bool,
}

impl InstantSearchApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &EngineConfig,
        service: Arc<dyn SearchService>,
        navigator: Arc<dyn Navigator>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        // 白天(6:00-18:00)浅色，晚上深色
        let is_dark = !(6..18).contains(&chrono::Local::now().hour());
        cc.egui_ctx.set_visuals(if is_dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            engine: Engine::new(config),
            query_text: String::new(),
            service,
            navigator,
            runtime,
            done_tx,
            done_rx,
            input_rect: None,
            popup_rect: None,
            scroll_to_selected: false,
            is_dark,
        }
    }

    fn run_effects(&mut self, ctx: &egui::Context, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            match effect {
                Effect::Dispatch(request) => {
                    let ctx = ctx.clone();
                    spawn_dispatch(
                        &self.runtime,
                        self.service.clone(),
                        request,
                        self.done_tx.clone(),
                        move || ctx.request_repaint(),
                    );
                }
                Effect::Open(item) => {
                    if let Err(e) = self.navigator.open(&item) {
                        tracing::warn!("跳转失败: {}", e);
                    }
                }
            }
        }
    }

    /// 方向键、回车、Esc：弹窗显示时由引擎消费，否则交还窗口
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let keys = [
            (egui::Key::ArrowDown, Key::ArrowDown),
            (egui::Key::ArrowUp, Key::ArrowUp),
            (egui::Key::Enter, Key::Enter),
            (egui::Key::Escape, Key::Escape),
        ];
        for (egui_key, key) in keys {
            if !self.engine.popup_visible() {
                break;
            }
            if !ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui_key)) {
                continue;
            }
            if let KeyOutcome::Consumed { effect } = self.engine.on_key(key) {
                self.run_effects(ctx, effect);
            }
            if matches!(key, Key::ArrowDown | Key::ArrowUp) {
                self.scroll_to_selected = true;
            }
        }

        // 弹窗关闭时 Esc 最小化窗口
        if !self.engine.popup_visible() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
        }
    }

    fn handle_outside_click(&mut self, ctx: &egui::Context) {
        let press = ctx.input(|i| {
            if i.pointer.any_pressed() {
                i.pointer.interact_pos()
            } else {
                None
            }
        });
        let Some(pos) = press else { return };
        let inside = |rect: Option<egui::Rect>| rect.is_some_and(|r| r.contains(pos));
        let target = if inside(self.input_rect) {
            PointerTarget::Input
        } else if self.engine.popup_visible() && inside(self.popup_rect) {
            PointerTarget::Popup
        } else {
            PointerTarget::Outside
        };
        let effects = self.engine.on_pointer_down(target);
        self.run_effects(ctx, effects);
    }

    fn show_popup(&mut self, ctx: &egui::Context, anchor: egui::Rect, snapshot: &EngineSnapshot) {
        let mut clicked = None;
        let mut hovered = None;
        let highlight_bg = if self.is_dark {
            egui::Color32::from_rgb(120, 100, 20)
        } else {
            egui::Color32::from_rgb(255, 224, 102)
        };
        let selected_bg = if self.is_dark {
            egui::Color32::from_rgba_unmultiplied(100, 160, 255, 55)
        } else {
            egui::Color32::from_rgb(245, 247, 250)
        };
        let scroll_to_selected = std::mem::take(&mut self.scroll_to_selected);
        let mut load_more = false;

        let area = egui::Area::new(egui::Id::new("instant_search_popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor.left_bottom() + egui::vec2(0.0, 8.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(anchor.width());
                    if snapshot.showing_stale || snapshot.phase == Some(Phase::Loading) {
                        ui.label("搜索中…");
                    }
                    if let Some(error) = &snapshot.error {
                        ui.colored_label(egui::Color32::RED, error);
                    }
                    if snapshot.phase == Some(Phase::Open) && snapshot.items.is_empty() {
                        ui.weak("没有找到结果");
                    }

                    egui::ScrollArea::vertical()
                        .max_height(POPUP_MAX_HEIGHT)
                        .show(ui, |ui| {
                            for (i, item) in snapshot.items.iter().enumerate() {
                                let is_selected = snapshot.selected == Some(i);
                                let frame = egui::Frame::none()
                                    .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                                    .fill(if is_selected {
                                        selected_bg
                                    } else {
                                        egui::Color32::TRANSPARENT
                                    });
                                let row = frame
                                    .show(ui, |ui| {
                                        ui.set_width(ui.available_width());
                                        ui.label(row_header(item));
                                        ui.label(line_job(item, highlight_bg, ui.visuals().text_color()));
                                    })
                                    .response
                                    .interact(egui::Sense::click());
                                if row.hovered() {
                                    hovered = Some(i);
                                }
                                if row.clicked() {
                                    clicked = Some(i);
                                }
                                if is_selected && scroll_to_selected {
                                    row.scroll_to_me(Some(egui::Align::Center));
                                }
                            }
                            if snapshot.has_more && !snapshot.loading_more {
                                load_more = ui.button("加载更多").clicked();
                            } else if snapshot.loading_more {
                                ui.label("加载中…");
                            }
                        });
                    if snapshot.total_count > 0 {
                        ui.weak(format!("共 {} 条", snapshot.total_count));
                    }
                });
            });
        self.popup_rect = Some(area.response.rect);

        if let Some(i) = hovered {
            self.engine.hover(i);
        }
        if let Some(i) = clicked {
            let effects = self.engine.on_pointer_down(PointerTarget::Item(i));
            self.run_effects(ctx, effects);
        }
        if load_more {
            let effects = self.engine.load_more();
            self.run_effects(ctx, effects);
        }
    }
}

fn row_header(item: &ResultItem) -> egui::RichText {
    let mut text = format!("{}  ·  {}  ·  第 {} 行", item.file_name(), item.repo, item.line_number);
    if let Some(lang) = &item.language {
        text.push_str(&format!("  ·  {}", lang));
    }
    egui::RichText::new(text).size(14.0).strong()
}

fn line_job(item: &ResultItem, highlight_bg: egui::Color32, color: egui::Color32) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    job.wrap.max_rows = 2;
    for segment in highlight_or_plain(&item.line, &item.match_ranges) {
        job.append(
            segment.text,
            0.0,
            egui::TextFormat {
                font_id: egui::FontId::monospace(13.0),
                color,
                background: if segment.is_matched() {
                    highlight_bg
                } else {
                    egui::Color32::TRANSPARENT
                },
                ..Default::default()
            },
        );
    }
    job
}

impl eframe::App for InstantSearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 0. 收取已返回的请求
        while let Ok(done) = self.done_rx.try_recv() {
            if self.engine.on_completion(done) {
                self.scroll_to_selected = true;
            }
        }

        // 1. 防抖到期
        let effects = self.engine.poll(Instant::now());
        self.run_effects(ctx, effects);
        if let Some(due) = self.engine.deadline() {
            ctx.request_repaint_after(due.saturating_duration_since(Instant::now()));
        }

        // 2. 键盘与外部点击（先于输入框处理，避免方向键移动光标）
        self.handle_keys(ctx);
        self.handle_outside_click(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(60.0);
            ui.vertical_centered(|ui| {
                ui.heading("全局代码搜索");
                ui.add_space(24.0);
                let input = ui.add(
                    egui::TextEdit::singleline(&mut self.query_text)
                        .hint_text("在所有仓库中搜索代码…")
                        .font(egui::TextStyle::Heading)
                        .desired_width(600.0),
                );
                self.input_rect = Some(input.rect);
                if input.changed() {
                    self.engine.on_query_changed(&self.query_text);
                }
                if input.gained_focus() {
                    self.engine.on_focus();
                }
            });
        });

        let snapshot = self.engine.snapshot();
        if snapshot.popup_visible {
            if let Some(anchor) = self.input_rect {
                self.show_popup(ctx, anchor, &snapshot);
            }
        } else {
            self.popup_rect = None;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.engine.teardown();
    }
}
