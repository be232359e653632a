#![forbid(unsafe_code)]

//! In-memory host and view doubles.
//!
//! `HeadlessHost` implements [`PopupHost`] without any rendering backend;
//! every view it hands out records the calls the engine makes into a
//! shared [`HeadlessViewState`] that a [`HeadlessProbe`] can inspect and
//! mutate mid-test (type into the main field, move focus, fail the crop
//! tool, withdraw the template).
//!
//! Single-threaded by construction (`Rc`/`RefCell`); the engine itself
//! never assumes otherwise.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::controls::{ButtonSpec, InputSpec, InputValue};
use crate::error::PopupError;
use crate::kind::PopupKind;
use crate::options::{Animation, LayoutFlags};
use crate::stack::PopupId;
use crate::view::{
    ControlRef, DeclaredControl, FocusTarget, PopupHost, PopupView, TransitionPhase,
};

/// A custom button as the view received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedButton {
    pub index: u16,
    pub label: String,
    pub classes: Vec<String>,
    pub append_at_end: bool,
}

/// Everything the engine told one view, plus knobs tests can turn.
#[derive(Debug, Default)]
pub struct HeadlessViewState {
    pub body: String,
    pub labels: AHashMap<ControlRef, String>,
    pub visibility: AHashMap<ControlRef, bool>,
    pub default_marker: Option<ControlRef>,
    pub layout: LayoutFlags,
    pub animation: Option<Animation>,
    pub main_value: String,
    pub main_rows: u16,
    pub main_visible: bool,
    pub custom_buttons: Vec<RecordedButton>,
    pub inputs: Vec<InputSpec>,
    pub input_values: AHashMap<String, InputValue>,
    pub declared: Vec<DeclaredControl>,
    pub crop: Option<(String, f64)>,
    pub autofocus: Option<FocusTarget>,
    pub focused: Option<FocusTarget>,
    pub open: bool,
    pub detached: bool,
    pub force_open_count: u32,
    pub transitions: Vec<TransitionPhase>,
    /// Returned from `begin_transition`; `false` simulates an environment
    /// that cannot report transition ends.
    pub transitions_detectable: bool,
}

#[derive(Debug)]
struct HeadlessShared {
    template_available: bool,
    enter_to_send: bool,
    crop_output: Result<String, String>,
    ok_overrides: AHashMap<PopupKind, String>,
    declared_controls: Vec<DeclaredControl>,
    transitions_detectable: bool,
    sanitize_calls: usize,
    views: AHashMap<PopupId, Rc<RefCell<HeadlessViewState>>>,
}

impl Default for HeadlessShared {
    fn default() -> Self {
        Self {
            template_available: true,
            enter_to_send: false,
            crop_output: Ok("cropped-image-data".to_string()),
            ok_overrides: AHashMap::new(),
            declared_controls: Vec::new(),
            transitions_detectable: true,
            sanitize_calls: 0,
            views: AHashMap::new(),
        }
    }
}

/// Renderless [`PopupHost`] for tests.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    shared: Rc<RefCell<HeadlessShared>>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspection handle that stays valid after the host moves into a stack.
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl PopupHost for HeadlessHost {
    fn instantiate(&mut self, id: PopupId) -> Result<Box<dyn PopupView>, PopupError> {
        let mut shared = self.shared.borrow_mut();
        if !shared.template_available {
            return Err(PopupError::TemplateMissing);
        }
        let state = Rc::new(RefCell::new(HeadlessViewState {
            declared: shared.declared_controls.clone(),
            transitions_detectable: shared.transitions_detectable,
            ..HeadlessViewState::default()
        }));
        shared.views.insert(id, Rc::clone(&state));
        Ok(Box::new(HeadlessView {
            state,
            shared: Rc::clone(&self.shared),
        }))
    }

    fn sanitize(&self, raw: &str) -> String {
        self.shared.borrow_mut().sanitize_calls += 1;
        raw.replace("<script>", "").replace("</script>", "")
    }

    fn enter_to_send(&self) -> bool {
        self.shared.borrow().enter_to_send
    }

    fn ok_label(&self, kind: PopupKind) -> Option<String> {
        self.shared.borrow().ok_overrides.get(&kind).cloned()
    }
}

/// Test-side handle onto a [`HeadlessHost`] and its views.
#[derive(Debug)]
pub struct HeadlessProbe {
    shared: Rc<RefCell<HeadlessShared>>,
}

impl HeadlessProbe {
    /// Recorded state of the view created for `id`, if one exists.
    pub fn view(&self, id: PopupId) -> Option<Rc<RefCell<HeadlessViewState>>> {
        self.shared.borrow().views.get(&id).cloned()
    }

    /// How many bodies went through the sanitizer.
    pub fn sanitize_calls(&self) -> usize {
        self.shared.borrow().sanitize_calls
    }

    pub fn set_template_available(&self, available: bool) {
        self.shared.borrow_mut().template_available = available;
    }

    pub fn set_enter_to_send(&self, enabled: bool) {
        self.shared.borrow_mut().enter_to_send = enabled;
    }

    pub fn set_crop_output(&self, output: Result<String, String>) {
        self.shared.borrow_mut().crop_output = output;
    }

    pub fn set_ok_label(&self, kind: PopupKind, label: impl Into<String>) {
        self.shared
            .borrow_mut()
            .ok_overrides
            .insert(kind, label.into());
    }

    /// Declare a template-level extra control with a raw result attribute.
    pub fn declare_control(&self, result: impl Into<String>) {
        let mut shared = self.shared.borrow_mut();
        let index = shared.declared_controls.len() as u16;
        shared.declared_controls.push(DeclaredControl {
            index,
            result: result.into(),
        });
    }

    /// Make future views report transitions as undetectable.
    pub fn set_transitions_detectable(&self, detectable: bool) {
        self.shared.borrow_mut().transitions_detectable = detectable;
    }
}

struct HeadlessView {
    state: Rc<RefCell<HeadlessViewState>>,
    shared: Rc<RefCell<HeadlessShared>>,
}

impl PopupView for HeadlessView {
    fn set_body(&mut self, markup: &str) {
        self.state.borrow_mut().body = markup.to_string();
    }

    fn apply_layout(&mut self, flags: LayoutFlags) {
        self.state.borrow_mut().layout = flags;
    }

    fn set_animation(&mut self, animation: Animation) {
        self.state.borrow_mut().animation = Some(animation);
    }

    fn set_control_visible(&mut self, control: ControlRef, visible: bool) {
        self.state.borrow_mut().visibility.insert(control, visible);
    }

    fn set_control_label(&mut self, control: ControlRef, label: &str) {
        self.state
            .borrow_mut()
            .labels
            .insert(control, label.to_string());
    }

    fn mark_default(&mut self, control: ControlRef) {
        self.state.borrow_mut().default_marker = Some(control);
    }

    fn configure_main_input(&mut self, value: &str, rows: u16, visible: bool) {
        let mut state = self.state.borrow_mut();
        state.main_value = value.to_string();
        state.main_rows = rows;
        state.main_visible = visible;
    }

    fn main_input_value(&self) -> String {
        self.state.borrow().main_value.clone()
    }

    fn insert_custom_button(&mut self, index: u16, spec: &ButtonSpec) {
        self.state.borrow_mut().custom_buttons.push(RecordedButton {
            index,
            label: spec.label.clone(),
            classes: spec.classes.clone(),
            append_at_end: spec.append_at_end,
        });
    }

    fn insert_custom_input(&mut self, spec: &InputSpec) {
        let mut state = self.state.borrow_mut();
        state
            .input_values
            .insert(spec.id.clone(), spec.default.clone());
        state.inputs.push(spec.clone());
    }

    fn input_value(&self, id: &str) -> Option<InputValue> {
        self.state.borrow().input_values.get(id).cloned()
    }

    fn declared_controls(&self) -> Vec<DeclaredControl> {
        self.state.borrow().declared.clone()
    }

    fn show_crop(&mut self, image: &str, aspect: f64) {
        self.state.borrow_mut().crop = Some((image.to_string(), aspect));
    }

    fn crop_result(&mut self) -> Result<String, String> {
        self.shared.borrow().crop_output.clone()
    }

    fn set_autofocus(&mut self, target: &FocusTarget) {
        self.state.borrow_mut().autofocus = Some(target.clone());
    }

    fn focus(&mut self, target: &FocusTarget) {
        self.state.borrow_mut().focused = Some(target.clone());
    }

    fn focused(&self) -> Option<FocusTarget> {
        self.state.borrow().focused.clone()
    }

    fn open_modal(&mut self) {
        self.state.borrow_mut().open = true;
    }

    fn force_open(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = true;
        state.force_open_count += 1;
    }

    fn begin_transition(&mut self, phase: TransitionPhase) -> bool {
        let mut state = self.state.borrow_mut();
        state.transitions.push(phase);
        state.transitions_detectable
    }

    fn detach(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.detached = true;
    }

    fn is_visible(&self) -> bool {
        let state = self.state.borrow();
        state.open && !state.detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizer_strips_script_tags() {
        let host = HeadlessHost::new();
        let probe = host.probe();
        let clean = host.sanitize("<p>hi</p><script>alert(1)</script>");
        assert_eq!(clean, "<p>hi</p>alert(1)");
        assert_eq!(probe.sanitize_calls(), 1);
    }

    #[test]
    fn missing_template_refuses_instantiation() {
        let mut host = HeadlessHost::new();
        host.probe().set_template_available(false);
        let result = host.instantiate(PopupId::test_id());
        assert!(matches!(result, Err(PopupError::TemplateMissing)));
    }

    #[test]
    fn view_records_engine_calls() {
        let mut host = HeadlessHost::new();
        let probe = host.probe();
        let id = PopupId::test_id();
        let mut view = host.instantiate(id).unwrap();
        view.set_body("<p>x</p>");
        view.set_control_label(ControlRef::Ok, "Go");
        view.open_modal();
        assert!(view.is_visible());
        let state = probe.view(id).unwrap();
        assert_eq!(state.borrow().body, "<p>x</p>");
        assert_eq!(
            state.borrow().labels.get(&ControlRef::Ok).map(String::as_str),
            Some("Go")
        );
    }
}
