use crate::Coords;
use Direction::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    /// Unit step for this heading. Screen coordinates: y grows downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn head_char(&self) -> char {
        match self {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}

pub fn step(pos: Coords, direction: Direction) -> Coords {
    let (dx, dy) = direction.delta();
    (pos.0 + dx, pos.1 + dy)
}

/// Snake body, head first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: Vec<Coords>,
}

impl Snake {
    pub fn new(head: Coords) -> Self {
        Snake { body: vec![head] }
    }

    #[cfg(test)]
    pub fn from_body(body: Vec<Coords>) -> Option<Self> {
        if body.is_empty() {
            None
        } else {
            Some(Snake { body })
        }
    }

    pub fn body(&self) -> &[Coords] {
        &self.body
    }

    pub fn head(&self) -> Coords {
        self.body[0]
    }

    pub fn tail(&self) -> Coords {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn contains(&self, pos: &Coords) -> bool {
        self.body.contains(pos)
    }

    /// Whether moving the head onto `pos` hits the body. The tail cell only
    /// counts when the snake is growing, otherwise it is vacated this tick.
    pub fn bites(&self, pos: Coords, growing: bool) -> bool {
        let end = if growing { self.body.len() } else { self.body.len() - 1 };
        self.body[..end].contains(&pos)
    }

    /// New snake with `new_head` in front. The last segment is dropped unless growing.
    pub fn moved(&self, new_head: Coords, growing: bool) -> Snake {
        let keep = if growing { self.body.len() } else { self.body.len() - 1 };
        let mut body = Vec::with_capacity(keep + 1);
        body.push(new_head);
        body.extend_from_slice(&self.body[..keep]);
        Snake { body }
    }
}
