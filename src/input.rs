use crate::snake::Direction::{*, self};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Translation of a drag, in terminal cells, from where the button went down.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Swipe {
    pub dx: i32,
    pub dy: i32,
}

impl Swipe {
    pub fn new(dx: i32, dy: i32) -> Self {
        Swipe { dx, dy }
    }

    pub fn is_empty(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Dominant axis wins. Ties go to the vertical axis.
    pub fn direction(&self) -> Direction {
        if self.dx.abs() > self.dy.abs() {
            if self.dx > 0 { Right } else { Left }
        } else if self.dy > 0 {
            Down
        } else {
            Up
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Control {
    Turn(Direction),
    TogglePause,
    Reset,
    Quit,
}

/// Turns terminal events into game controls. Mouse drags act as swipes.
#[derive(Default)]
pub struct InputHandler {
    drag_start: Option<(u16, u16)>,
}

impl InputHandler {
    pub fn new() -> Self {
        InputHandler { drag_start: None }
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<Control> {
        match event {
            Event::Key(key) => handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => None,
        }
    }

    fn handle_mouse(&mut self, ev: &MouseEvent) -> Option<Control> {
        let pos = (ev.column, ev.row);

        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_start = Some(pos);
                None
            },
            MouseEventKind::Drag(MouseButton::Left) => self.swipe_to(pos),
            MouseEventKind::Up(_) => {
                let control = self.swipe_to(pos);
                self.drag_start = None;
                control
            },
            _ => None,
        }
    }

    fn swipe_to(&self, pos: (u16, u16)) -> Option<Control> {
        let start = self.drag_start?;
        let swipe = Swipe::new(pos.0 as i32 - start.0 as i32, pos.1 as i32 - start.1 as i32);

        if swipe.is_empty() {
            None
        } else {
            Some(Control::Turn(swipe.direction()))
        }
    }
}

pub fn is_ctrl_c(ev: &KeyEvent) -> bool {
    ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_key(ev: &KeyEvent) -> Option<Control> {
    if is_ctrl_c(ev) {
        return Some(Control::Quit);
    }

    match ev.code {
        KeyCode::Char('w') | KeyCode::Up => Some(Control::Turn(Up)),
        KeyCode::Char('a') | KeyCode::Left => Some(Control::Turn(Left)),
        KeyCode::Char('s') | KeyCode::Down => Some(Control::Turn(Down)),
        KeyCode::Char('d') | KeyCode::Right => Some(Control::Turn(Right)),
        KeyCode::Char(' ') | KeyCode::Esc => Some(Control::TogglePause),
        KeyCode::Char('r') => Some(Control::Reset),
        KeyCode::Char('q') => Some(Control::Quit),
        _ => None,
    }
}
