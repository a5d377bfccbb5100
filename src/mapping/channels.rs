use std::collections::HashMap;

/// Discord webhook URLs keyed by the channel names projects refer to.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    webhooks: HashMap<String, String>,
}

impl ChannelDirectory {
    pub fn new(webhooks: HashMap<String, String>) -> Self {
        Self { webhooks }
    }

    pub fn webhook_url(&self, key: Option<&str>) -> Option<&str> {
        key.and_then(|key| self.webhooks.get(key))
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}
