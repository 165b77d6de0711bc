/// Convert `src` from snake case to lowerCamelCase, appending to `dst`.
///
/// Fails if the conversion could not be reversed by [`camel_case_to_snake_case`],
/// for example when `src` contains an uppercase letter, a trailing underscore or
/// a digit following an underscore.
pub(crate) fn snake_case_to_camel_case(dst: &mut String, src: &str) -> Result<(), ()> {
    let mut ucase_next = false;
    for ch in src.chars() {
        if ch.is_ascii_uppercase() {
            return Err(());
        }

        if ucase_next {
            let upper_ch = ch.to_ascii_uppercase();
            if upper_ch == ch {
                return Err(());
            }

            dst.push(upper_ch);
            ucase_next = false;
        } else if ch == '_' {
            ucase_next = true;
        } else {
            dst.push(ch)
        }
    }

    if ucase_next {
        return Err(());
    }
    Ok(())
}

pub(crate) fn camel_case_to_snake_case(dst: &mut String, src: &str) -> Result<(), ()> {
    for ch in src.chars() {
        if ch.is_ascii_uppercase() {
            dst.push('_');
            dst.push(ch.to_ascii_lowercase());
        } else if ch == '_' {
            return Err(());
        } else {
            dst.push(ch);
        }
    }

    Ok(())
}
