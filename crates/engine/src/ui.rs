//! Form surface and submit handling.

use coldiff_api::DiffService;
use coldiff_types::form::{INSTRUCTIONS_MARKDOWN, click_echo};
use coldiff_types::{FormSpec, FormSubmission};

use crate::compare::{ColumnIndices, CompareOptions, CompareSummary, compare_columns};
use crate::error::RunError;
use crate::host::Base;
use crate::report::{Reporter, RunEvent};

/// Where markdown blocks end up: a plugin panel, a terminal, a test buffer.
pub trait UiSurface {
    fn markdown(&mut self, text: &str);
}

impl UiSurface for Vec<String> {
    fn markdown(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// Render the instruction block followed by a description of `form`.
pub fn render_form<U: UiSurface + ?Sized>(ui: &mut U, form: &FormSpec) {
    ui.markdown(INSTRUCTIONS_MARKDOWN);

    let mut description = String::new();
    for item in &form.items {
        description.push_str(&format!("* `{}`: {} (默认 {})\n", item.key, item.label, item.default_value));
    }
    for button in &form.buttons {
        description.push_str(&format!("\n[{button}]\n"));
    }
    ui.markdown(&description);
}

/// Handle one button press: echo it, validate the inputs, run the comparison.
///
/// Non-numeric inputs fail before the host or the diff service is touched.
pub async fn handle_submission<U, B, D, R>(
    ui: &mut U,
    submission: &FormSubmission,
    base: &B,
    diff_service: &D,
    reporter: &R,
    options: &CompareOptions,
) -> Result<CompareSummary, RunError>
where
    U: UiSurface + ?Sized,
    B: Base,
    D: DiffService + ?Sized,
    R: Reporter + ?Sized,
{
    ui.markdown(&click_echo(&submission.key));
    reporter.report(RunEvent::Clicked {
        button: &submission.key,
    });

    let indices = match ColumnIndices::from_form_values(&submission.values) {
        Ok(indices) => indices,
        Err(error) => {
            reporter.report(RunEvent::Failed {
                error: &error,
                processed: 0,
            });
            return Err(error);
        }
    };

    compare_columns(base, diff_service, reporter, &indices, options).await
}
