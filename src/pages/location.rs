//! Page state carried in the URL query string
//!
//! Values are parsed the way the dashboard router does it: numbers and
//! booleans become typed JSON values, `name[]=a&name[]=b` becomes an array.
//! Writing skips `null` and empty strings, so clearing a parameter is done by
//! pushing it as `null`.

use serde_json::{Map, Number, Value};
use url::form_urlencoded;

/// How [`LocationParams::push`] combines new parameters with the current ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    /// Merge into the current query instead of replacing it
    pub update: bool,
    /// Replace the current history entry instead of adding one
    pub replace: bool,
}

impl PushOptions {
    pub fn update() -> Self {
        Self {
            update: true,
            replace: false,
        }
    }
}

/// Path and parsed query of the current location, plus its history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationParams {
    path: String,
    query: Map<String, Value>,
    history: Vec<String>,
}

impl LocationParams {
    /// Parse a location such as `/admin/courses?pageSize=10&add=true`
    ///
    /// A `#` fragment before the query (Telegram web-app links) is dropped.
    pub fn parse(location: &str) -> Self {
        let (path, query) = split_location(location);
        let url = format!("{path}{}", if query.is_empty() { String::new() } else { format!("?{query}") });

        Self {
            path: path.to_string(),
            query: parse_query(query),
            history: vec![url],
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.query.get(name).and_then(Value::as_u64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.query.get(name).and_then(Value::as_str)
    }

    /// Whether a flag parameter is set to a truthy value
    pub fn flag(&self, name: &str) -> bool {
        match self.query.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    /// Navigate to new query parameters on the same path
    pub fn push(&mut self, params: Map<String, Value>, options: PushOptions) {
        let mut query = if options.update {
            self.query.clone()
        } else {
            Map::new()
        };
        query.extend(params);
        query.retain(|_, value| !is_empty(value));

        self.query = query;
        let url = self.to_url();
        if self.history.last() == Some(&url) {
            return;
        }

        if options.replace {
            self.history.pop();
        }
        tracing::debug!(url = %url, replace = options.replace, "location push");
        self.history.push(url);
    }

    /// Serialize back to `path?query`, keys in sorted order
    pub fn to_url(&self) -> String {
        let query = stringify_query(&self.query);
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }

    /// Visited URLs, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

fn split_location(location: &str) -> (&str, &str) {
    let query = location.split_once('?').map_or("", |(_, query)| query);
    let path = location
        .split(['#', '?'])
        .next()
        .unwrap_or_default();
    (path, query)
}

fn parse_query(query: &str) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, raw) in form_urlencoded::parse(query.as_bytes()) {
        let value = parse_value(&raw);
        match key.strip_suffix("[]") {
            Some(name) => {
                let entry = map
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = entry {
                    items.push(value);
                }
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

fn parse_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "" => return Value::String(String::new()),
        _ => {}
    }

    // keep ids like "007" or huge numbers as strings
    let canonical = raw == "0" || !raw.starts_with('0') || raw.starts_with("0.");
    if canonical {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::from(n);
        }
        if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
            if raw.len() <= 15 && !raw.contains(['e', 'E']) {
                return Value::Number(n);
            }
        }
    }
    Value::String(raw.to_string())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn stringify_query(query: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = query.keys().collect();
    keys.sort();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for key in keys {
        match &query[key] {
            Value::Array(items) => {
                let name = format!("{key}[]");
                for item in items.iter().filter(|item| !is_empty(item)) {
                    serializer.append_pair(&name, &scalar_text(item));
                }
            }
            value if is_empty(value) => {}
            value => {
                serializer.append_pair(key, &scalar_text(value));
            }
        }
    }
    serializer.finish()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pagination arguments derived from the location (`pageSize`, `pageNumber`)
#[derive(Debug, Clone, PartialEq)]
pub struct TableFetchProps {
    pub take: Option<u64>,
    pub skip: u64,
    pub order_by: Value,
}

impl TableFetchProps {
    /// `take = pageSize`, `skip = (pageNumber - 1) * pageSize`, newest first
    ///
    /// `pageNumber` defaults to 1; without `pageSize` nothing is taken. A skip
    /// beyond `u64::MAX` is clamped.
    pub fn from_location(location: &LocationParams) -> Self {
        let take = location.get_u64("pageSize").filter(|size| *size > 0);
        let page = location.get_u64("pageNumber").unwrap_or(1).max(1);
        let skip = take.map_or(0, |size| (page - 1).saturating_mul(size));

        let mut order_by = Map::new();
        order_by.insert("createdAt".to_string(), Value::String("desc".to_string()));

        Self {
            take,
            skip,
            order_by: Value::Object(order_by),
        }
    }

    pub fn page_number(&self) -> u64 {
        match self.take {
            Some(size) => self.skip / size + 1,
            None => 1,
        }
    }

    /// The arguments as JSON, as merged under the caller's read arguments
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(take) = self.take {
            map.insert("take".to_string(), Value::from(take));
            map.insert("skip".to_string(), Value::from(self.skip));
        }
        map.insert("orderBy".to_string(), self.order_by.clone());
        map
    }
}
