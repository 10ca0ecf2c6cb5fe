/// Test data factories using builder pattern
///
/// Builds CSV text and uploads with sensible defaults
use fieldcrm_lib::modules::client_imports::{ImportType, ImportUpload};

pub struct CsvFactory {
    delimiter: char,
    header: Vec<String>,
    lines: Vec<String>,
}

impl Default for CsvFactory {
    fn default() -> Self {
        Self::with_header(&["name", "email", "phone"])
    }
}

impl CsvFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(columns: &[&str]) -> Self {
        Self {
            delimiter: ',',
            header: columns.iter().map(|c| c.to_string()).collect(),
            lines: Vec::new(),
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.lines.push(values.join(&self.delimiter.to_string()));
        self
    }

    /// `count` rows named "Client 1", "Client 2", ... with the other cells filled
    pub fn clients(mut self, count: usize) -> Self {
        for i in 1..=count {
            let values: Vec<String> = self
                .header
                .iter()
                .map(|column| match column.as_str() {
                    c if c.contains("name") => format!("Client {}", i),
                    c if c.contains("email") => format!("client{}@example.com", i),
                    c if c.contains("phone") => format!("555-01{:02}", i),
                    _ => format!("value {}", i),
                })
                .collect();
            self.lines.push(values.join(&self.delimiter.to_string()));
        }
        self
    }

    pub fn blank_line(mut self) -> Self {
        self.lines.push(String::new());
        self
    }

    pub fn build(self) -> String {
        let mut text = self.header.join(&self.delimiter.to_string());
        text.push('\n');
        for line in self.lines {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }
}

pub fn upload(file_name: &str, import_type: ImportType, content: impl Into<String>) -> ImportUpload {
    ImportUpload::new(file_name, import_type, content)
}

pub fn customers_upload(content: impl Into<String>) -> ImportUpload {
    upload("customers.csv", ImportType::Customers, content)
}
