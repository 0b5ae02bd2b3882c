use color_print::cformat;

use crate::{
    encode::Binary,
    ir::{Code, Element},
};

/// Print `[offset] bytes | instruction` for every element, with labels inline.
pub fn print_dump(code: &Code, binary: &Binary) {
    let mut offset = 0;
    for element in code.elements() {
        match element {
            Element::Label(name) => {
                println!("{:28}| {}", "", cformat!("<g>{}:</>", name));
            }
            Element::Inst(inst) => {
                let size = inst.size();
                let bytes = binary
                    .bytes
                    .get(offset..offset + size)
                    .map(|b| {
                        b.iter()
                            .take(8)
                            .map(|x| format!("{:02X}", x))
                            .collect::<String>()
                    })
                    .unwrap_or_else(|| cformat!("<r,s>!!</>"));
                let more = if size > 8 { "+" } else { " " };
                println!(
                    "[{:04X}] {:<16}{} |   {}",
                    offset,
                    bytes,
                    more,
                    inst.cformat()
                );
                offset += size;
            }
        }
    }
    println!("----------------------------+---------------------------------------");
}
