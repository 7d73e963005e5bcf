// ui.rs - Board painter and controls, fed entirely from the event stream

use conway_dist::{Event, Params, State};
use eframe::egui;
use egui::{Color32, Rect, Vec2};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::warn;

/// Events applied per frame before painting, so a busy engine can't freeze the window.
const EVENTS_PER_FRAME: usize = 200_000;
const BOARD_PIXELS: f32 = 800.0;

pub struct LiveView {
    params: Params,
    board: Vec<bool>,
    events: mpsc::Receiver<Event>,
    keys: mpsc::Sender<char>,

    turn: usize,
    alive: usize,
    last_report: Option<(usize, usize)>,
    state: State,
    last_snapshot: Option<String>,
    finished: bool,

    pub live_color: Color32,
    pub dead_color: Color32,

    _runtime: tokio::runtime::Runtime,  // Keeps the engine alive as long as the window
}

impl LiveView {
    pub fn new(
        params: Params,
        events: mpsc::Receiver<Event>,
        keys: mpsc::Sender<char>,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        Self {
            params,
            board: vec![false; params.image_width * params.image_height],
            events,
            keys,
            turn: 0,
            alive: 0,
            last_report: None,
            state: State::Executing,
            last_snapshot: None,
            finished: false,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
            _runtime: runtime,
        }
    }

    fn drain_events(&mut self) {
        for _ in 0..EVENTS_PER_FRAME {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::CellFlipped { cell, .. } => {
                let index = cell.y * self.params.image_width + cell.x;
                if let Some(alive) = self.board.get_mut(index) {
                    *alive = !*alive;
                    if *alive { self.alive += 1 } else { self.alive -= 1 }
                }
            }
            Event::TurnComplete { completed_turns } => self.turn = completed_turns,
            Event::AliveCellsCount { completed_turns, cells_count } => {
                self.last_report = Some((completed_turns, cells_count));
            }
            Event::ImageOutputComplete { filename, .. } => self.last_snapshot = Some(filename),
            Event::FinalTurnComplete { completed_turns, .. } => self.turn = completed_turns,
            Event::StateChange { new_state, .. } => self.state = new_state,
        }
    }

    fn press(&self, key: char) {
        if self.finished {
            return;
        }
        if let Err(err) = self.keys.try_send(key) {
            warn!(%err, key = %key, "key press dropped");
        }
    }
}

impl eframe::App for LiveView {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        // Keyboard shortcuts mirror the buttons
        let (pause, snapshot, quit) = ctx.input(|i| {
            (i.key_pressed(egui::Key::P), i.key_pressed(egui::Key::S), i.key_pressed(egui::Key::Q))
        });
        if pause { self.press('p'); }
        if snapshot { self.press('s'); }
        if quit { self.press('q'); }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Distributed Game of Life (Row-Band Workers)");

            // Controls
            ui.horizontal(|ui| {
                let button_text = if self.state == State::Paused { "▶ Resume" } else { "⏸ Pause" };
                if ui.button(button_text).clicked() {
                    self.press('p');
                }
                if ui.button("📷 Snapshot").clicked() {
                    self.press('s');
                }
                if ui.button("⏹ Quit").clicked() {
                    self.press('q');
                }

                ui.separator();

                ui.label(format!("Turn: {}", self.turn));
                ui.label(format!("State: {}", if self.finished { "Finished".to_string() } else { self.state.to_string() }));
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);

                ui.separator();

                ui.label(format!("{} workers", self.params.threads.min(self.params.image_height)));
                if let Some(name) = &self.last_snapshot {
                    ui.label(format!("Last snapshot: {name}"));
                }
            });

            ui.separator();

            ui.label("Keys: P pause/resume, S snapshot, Q quit");

            ui.separator();

            // Draw the board, scaled to fit
            let (width, height) = (self.params.image_width, self.params.image_height);
            let box_size = (BOARD_PIXELS / width.max(height) as f32).max(1.0);
            let spacing = if box_size >= 4.0 { 0.5 } else { 0.0 };

            let start_pos = ui.cursor().min;
            let total_size = Vec2::new(width as f32 * box_size, height as f32 * box_size);
            let (_response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());

            painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, self.dead_color);

            // Only live cells are painted over the background
            for (index, _) in self.board.iter().enumerate().filter(|&(_, &alive)| alive) {
                let (col, row) = (index % width, index / width);
                let rect = Rect::from_min_size(
                    egui::pos2(start_pos.x + col as f32 * box_size, start_pos.y + row as f32 * box_size),
                    Vec2::splat(box_size - spacing),
                );
                painter.rect_filled(rect, 0.0, self.live_color);
            }

            ui.separator();

            let total = (width * height) as f32;
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {}", self.alive));
                ui.label(format!("Population: {:.1}%", (self.alive as f32 / total) * 100.0));
                if let Some((turn, count)) = self.last_report {
                    ui.label(format!("Last report: {count} alive at turn {turn}"));
                }
            });
        });

        // Keep repainting while the engine is producing events
        if !self.finished {
            ctx.request_repaint();
        }
    }
}
