#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    pub dir_prefix: &'static str,
    pub file_prefix: &'static str,
    pub cursor: &'static str,
    pub collapsed: &'static str,
    pub expanded: &'static str,
    pub selected: &'static str,
    pub spinner: &'static [&'static str],
}

impl Glyphs {
    /// Spinner frame for the given tick.
    pub fn spinner_frame(&self, tick: usize) -> &'static str {
        self.spinner[tick % self.spinner.len()]
    }
}

pub fn select(fancy_requested: bool) -> Glyphs {
    if fancy_requested {
        fancy()
    } else {
        ascii()
    }
}

fn ascii() -> Glyphs {
    Glyphs {
        dir_prefix: "+ ",
        file_prefix: "  ",
        cursor: "_",
        collapsed: ">",
        expanded: "v",
        selected: ">",
        spinner: &["|", "/", "-", "\\"],
    }
}

fn fancy() -> Glyphs {
    Glyphs {
        dir_prefix: "📁 ",
        file_prefix: "📄 ",
        cursor: "█",
        collapsed: "▸",
        expanded: "▾",
        selected: "›",
        spinner: &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_wraps() {
        let glyphs = select(false);
        assert_eq!(glyphs.spinner_frame(0), "|");
        assert_eq!(glyphs.spinner_frame(4), "|");
        assert_eq!(glyphs.spinner_frame(5), "/");
    }
}
