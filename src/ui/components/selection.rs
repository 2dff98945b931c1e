//! Wrapping cursor movement shared by every list and table screen.

pub fn next_index(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let i = match selected {
        Some(i) => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        None => 0,
    };
    Some(i)
}

pub fn previous_index(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let i = match selected {
        Some(i) => {
            if i == 0 || i >= len {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    Some(i)
}

/// Keeps a selection inside a list that may have shrunk.
pub fn clamp_index(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(selected.unwrap_or(0).min(len - 1))
    }
}
