#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use poem_harvester::app::ports::{HttpClientPort, HttpGetResult, SleepPort, TransportError};

/// Canned responses per URL. Each URL replays its script in order and then keeps
/// returning the last entry; unknown URLs are 404s.
#[derive(Default)]
pub struct StubSite {
    scripts: RefCell<HashMap<String, VecDeque<(u16, String, Option<String>)>>>,
    calls: RefCell<HashMap<String, u32>>,
}

impl StubSite {
    pub fn serve(&self, url: &str, body: impl Into<String>) {
        self.script(url, vec![(200, body.into(), None)]);
    }

    pub fn script(&self, url: &str, responses: Vec<(u16, String, Option<String>)>) {
        self.scripts.borrow_mut().insert(url.to_string(), responses.into());
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.borrow().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.borrow().values().sum()
    }
}

impl HttpClientPort for StubSite {
    fn get(&self, url: &str) -> Result<HttpGetResult, TransportError> {
        *self.calls.borrow_mut().entry(url.to_string()).or_default() += 1;
        let mut scripts = self.scripts.borrow_mut();
        let Some(script) = scripts.get_mut(url) else {
            return Ok(HttpGetResult { status: 404, bytes: Vec::new(), retry_after: None });
        };
        let (status, body, retry_after) = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        };
        Ok(HttpGetResult { status, bytes: body.into_bytes(), retry_after })
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: RefCell<Vec<Duration>>,
}

impl SleepPort for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

pub const LIST_TEMPLATE: &str = "https://poems.test/list?page={page}";

pub fn list_url(page: u32) -> String {
    LIST_TEMPLATE.replace("{page}", &page.to_string())
}

/// A listing page with three well-formed rows plus the usual page furniture.
pub fn listing_page(page: u32) -> String {
    let rows: String = (1..=3)
        .map(|i| {
            format!(
                "<tr><td><a href=\"/author-{page}/poem-{page}-{i}\">Poem {page}.{i}</a></td>\
                 <td>Author {page}</td><td>{lines}</td><td>{views}</td></tr>",
                lines = 8 + i,
                views = format!("{},{:03}", page, i),
            )
        })
        .collect();
    format!(
        "<html><body>\
         <table><tr><td>Main Menu</td></tr></table>\
         <table><tr><th>Poem Title</th><th>Author</th><th>Lines</th><th>Views</th></tr>{rows}</table>\
         </body></html>"
    )
}
