//! Description of the compare form shown to the user.
//!
//! The form has one instruction block, three numeric inputs holding
//! zero-based positions into the view's visible field list, and a single
//! submit button.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Form key of the source (original text) column position.
pub const SRC_IDX_KEY: &str = "srcIdx";
/// Form key of the modified text column position.
pub const TARGET_IDX_KEY: &str = "targetIdx";
/// Form key of the destination column position.
pub const DIFF_IDX_KEY: &str = "diffIdx";

/// Label of the only submit button.
pub const COMPARE_BUTTON: &str = "对比";

/// Instruction markdown rendered above the form.
pub const INSTRUCTIONS_MARKDOWN: &str = "\
## 对比选中的两列
* step1: 选中A列
* step2: 选中B列
* step3: 点击按钮
";

/// A numeric input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormItem {
    pub key: String,
    pub label: String,
    pub default_value: i64,
}

/// Inputs and buttons of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSpec {
    pub items: Vec<FormItem>,
    pub buttons: Vec<String>,
}

impl FormSpec {
    /// The compare form: source, modified and destination positions
    /// defaulting to 1, 2 and 3.
    pub fn compare() -> Self {
        let item = |key: &str, label: &str, default_value| FormItem {
            key: key.to_string(),
            label: label.to_string(),
            default_value,
        };
        Self {
            items: vec![
                item(SRC_IDX_KEY, "输入(原数据)所在列(第一列0)", 1),
                item(TARGET_IDX_KEY, "输入(对比数据)所在列(第一列0)", 2),
                item(DIFF_IDX_KEY, "输入对比结果链接写入列(第一列0)", 3),
            ],
            buttons: vec![COMPARE_BUTTON.to_string()],
        }
    }

    /// Values a submission carries when the user leaves every input untouched.
    pub fn default_values(&self) -> Map<String, Value> {
        self.items
            .iter()
            .map(|item| (item.key.clone(), Value::from(item.default_value)))
            .collect()
    }
}

/// What the host hands back when a button is pressed. Values are loosely
/// typed: the renderer does not guarantee numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub key: String,
    pub values: Map<String, Value>,
}

/// Markdown echoed after a button press.
pub fn click_echo(button: &str) -> String {
    format!("你点击了**{button}**按钮")
}
