//! Floating preview content anchored to a cell.

use crate::observe::{Change, Dispatch, Listener, Observers, RecordKind};

/// A positioned piece of rendered content anchored to a cell key.
#[derive(Debug)]
pub struct Preview {
    key: String,
    html: String,
    embed: bool,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    observers: Observers,
}

/// Field values for constructing or restoring a preview.
#[derive(Debug, Default, Clone)]
pub struct PreviewInit {
    pub html: String,
    pub embed: bool,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Preview {
    pub fn new(key: impl Into<String>, init: PreviewInit, dispatch: Dispatch) -> Self {
        Self {
            key: key.into(),
            html: init.html,
            embed: init.embed,
            left: init.left,
            top: init.top,
            width: init.width,
            height: init.height,
            observers: Observers::new(dispatch),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn embed(&self) -> bool {
        self.embed
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn listen(&mut self, listener: Listener) {
        self.observers.listen(listener);
    }

    pub(crate) fn set_dispatch(&mut self, dispatch: Dispatch) {
        self.observers.set_dispatch(dispatch);
    }

    pub fn set_html(&mut self, html: impl Into<String>) {
        let html = html.into();
        if self.html == html {
            return;
        }
        self.html = html;
        self.notify_field("html");
    }

    pub fn set_embed(&mut self, embed: bool) {
        if self.embed == embed {
            return;
        }
        self.embed = embed;
        self.notify_field("embed");
    }

    pub fn set_left(&mut self, left: f64) {
        if self.left == left {
            return;
        }
        self.left = left;
        self.notify_field("left");
    }

    pub fn set_top(&mut self, top: f64) {
        if self.top == top {
            return;
        }
        self.top = top;
        self.notify_field("top");
    }

    pub fn set_width(&mut self, width: f64) {
        if self.width == width {
            return;
        }
        self.width = width;
        self.notify_field("width");
    }

    pub fn set_height(&mut self, height: f64) {
        if self.height == height {
            return;
        }
        self.height = height;
        self.notify_field("height");
    }

    fn notify_field(&self, name: &'static str) {
        self.observers
            .notify(Change::field(RecordKind::Preview, &self.key, name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::ChangeLog;

    #[test]
    fn setters_follow_notify_contract() {
        let log = ChangeLog::new();
        let mut preview = Preview::new("C4", PreviewInit::default(), Dispatch::Direct);
        preview.listen(log.listener());

        preview.set_left(120.0);
        preview.set_left(120.0);
        preview.set_html("<img src='chart.png'>");
        assert_eq!(log.field_names(), vec!["left", "html"]);
    }
}
