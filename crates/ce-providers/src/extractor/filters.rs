//! Prop filtering rules
//!
//! Extraction keeps component-specific props only. `children` always
//! survives; standard DOM event handlers, passthrough attributes and props
//! declared inside a third-party modules tree are rejected.

use ce_domain::value_objects::PropInfo;

/// Standard DOM event handler props (mouse, keyboard, focus, form, drag,
/// touch, pointer, clipboard, media, animation). Closed set.
pub const DOM_EVENT_PROPS: &[&str] = &[
    // mouse
    "onClick", "onDoubleClick", "onMouseDown", "onMouseUp", "onMouseEnter", "onMouseLeave",
    "onMouseMove", "onMouseOver", "onMouseOut", "onContextMenu", "onWheel",
    // keyboard
    "onKeyDown", "onKeyUp", "onKeyPress",
    // focus
    "onFocus", "onBlur",
    // form
    "onChange", "onInput", "onSubmit", "onReset", "onInvalid", "onSelect",
    // drag
    "onDrag", "onDragStart", "onDragEnd", "onDragEnter", "onDragLeave", "onDragOver", "onDrop",
    // touch
    "onTouchStart", "onTouchEnd", "onTouchMove", "onTouchCancel",
    // pointer
    "onPointerDown", "onPointerUp", "onPointerMove", "onPointerEnter", "onPointerLeave",
    "onPointerOver", "onPointerOut", "onPointerCancel", "onGotPointerCapture",
    "onLostPointerCapture",
    // clipboard
    "onCopy", "onCut", "onPaste",
    // media
    "onPlay", "onPause", "onEnded", "onLoadedData", "onLoadedMetadata", "onTimeUpdate",
    "onVolumeChange", "onWaiting", "onCanPlay", "onCanPlayThrough", "onDurationChange",
    "onSeeked", "onSeeking", "onStalled", "onSuspend",
    // animation / transition
    "onAnimationStart", "onAnimationEnd", "onAnimationIteration", "onTransitionEnd",
];

/// Passthrough DOM attributes that say nothing about the component's API
pub const PASSTHROUGH_PROPS: &[&str] = &[
    "className", "style", "id", "ref", "key", "slot", "tabIndex", "role", "title", "lang",
    "dir", "hidden", "draggable", "spellCheck", "translate", "contentEditable", "inputMode",
    "enterKeyHint", "autoFocus", "form", "formAction", "formEncType", "formMethod",
    "formNoValidate", "formTarget",
];

/// Whether a prop name is rejected by the closed filter sets
pub fn is_rejected_name(name: &str) -> bool {
    if name == "children" {
        return false;
    }
    if name.starts_with("aria-") || name.starts_with("data-") {
        return true;
    }
    DOM_EVENT_PROPS.contains(&name) || PASSTHROUGH_PROPS.contains(&name)
}

/// Whether a declaring file lives in a third-party modules tree
pub fn is_third_party_declaration(declared_in: Option<&str>) -> bool {
    declared_in.is_some_and(|path| path.contains("node_modules"))
}

/// Apply the filter to an extracted prop list, preserving order
pub fn filter_props(props: Vec<PropInfo>) -> Vec<PropInfo> {
    props
        .into_iter()
        .filter(|prop| prop.is_children || !is_rejected_name(&prop.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_is_always_kept() {
        let props = vec![
            PropInfo::new("children", "ReactNode"),
            PropInfo::new("onClick", "() => void"),
            PropInfo::new("className", "string"),
            PropInfo::new("variant", "string"),
            PropInfo::new("aria-label", "string"),
            PropInfo::new("data-testid", "string"),
        ];
        let kept = filter_props(props);
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["children", "variant"]);
    }

    #[test]
    fn third_party_paths_are_detected() {
        assert!(is_third_party_declaration(Some(
            "node_modules/@types/react/index.d.ts"
        )));
        assert!(!is_third_party_declaration(Some("src/components/button.tsx")));
        assert!(!is_third_party_declaration(None));
    }
}
