use access_transformer::classfile::ClassFile;
use access_transformer::RuleSetBuilder;

/// Class `demo/Counter` with a private field `count` and a private
/// recursive method `tick()V`, assembled by hand.
fn counter_class() -> Vec<u8> {
    let mut b = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
    let utf8 = |b: &mut Vec<u8>, s: &str| {
        b.push(1);
        b.extend_from_slice(&(s.len() as u16).to_be_bytes());
        b.extend_from_slice(s.as_bytes());
    };
    b.extend_from_slice(&12u16.to_be_bytes());
    utf8(&mut b, "demo/Counter"); // 1
    b.extend_from_slice(&[7, 0, 1]); // 2
    utf8(&mut b, "java/lang/Object"); // 3
    b.extend_from_slice(&[7, 0, 3]); // 4
    utf8(&mut b, "count"); // 5
    utf8(&mut b, "I"); // 6
    utf8(&mut b, "tick"); // 7
    utf8(&mut b, "()V"); // 8
    utf8(&mut b, "Code"); // 9
    b.extend_from_slice(&[12, 0, 7, 0, 8]); // 10 tick:()V
    b.extend_from_slice(&[10, 0, 2, 0, 10]); // 11 Counter.tick:()V

    b.extend_from_slice(&[0x00, 0x20, 0, 2, 0, 4, 0, 0]);
    b.extend_from_slice(&[0, 1, 0x00, 0x02, 0, 5, 0, 6, 0, 0]);
    b.extend_from_slice(&[0, 1, 0x00, 0x02, 0, 7, 0, 8, 0, 1]);
    // Code: aload_0; invokespecial #11; return
    b.extend_from_slice(&[0, 9, 0, 0, 0, 17, 0, 1, 0, 1, 0, 0, 0, 5]);
    b.extend_from_slice(&[0x2a, 0xb7, 0, 11, 0xb1, 0, 0, 0, 0]);
    b.extend_from_slice(&[0, 0]);
    b
}

fn main() {
    let ruleset = RuleSetBuilder::new()
        .source("public demo.Counter\npublic-f demo.Counter count\n")
        .source("protected demo.Counter tick()V\nprivate demo.Counter *\n")
        .build()
        .expect("failed to parse rules");

    let input = counter_class();
    let report = ruleset
        .transform_class_detailed(&input)
        .expect("failed to transform class");

    println!("{report}");
    println!();
    println!("Changed: {:?}", report.changes());
    println!("Denied downgrades: {:?}", report.denied_downgrades());
    println!("Rewritten calls: {:?}", report.rewritten_calls());

    let class = ClassFile::parse(report.bytes()).expect("output is a valid class");
    for method in class.methods() {
        println!("{} -> {:?}", method.signature(), method.access());
    }
}
