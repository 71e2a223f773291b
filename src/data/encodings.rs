// Named simple-font encodings: character code -> glyph name.

pub(crate) const STANDARD_ENCODING: [Option<&str>; 256] = [
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    Some("space"), Some("exclam"), Some("quotedbl"), Some("numbersign"),
    Some("dollar"), Some("percent"), Some("ampersand"), Some("quoteright"),
    Some("parenleft"), Some("parenright"), Some("asterisk"), Some("plus"),
    Some("comma"), Some("hyphen"), Some("period"), Some("slash"),
    Some("zero"), Some("one"), Some("two"), Some("three"),
    Some("four"), Some("five"), Some("six"), Some("seven"),
    Some("eight"), Some("nine"), Some("colon"), Some("semicolon"),
    Some("less"), Some("equal"), Some("greater"), Some("question"),
    Some("at"), Some("A"), Some("B"), Some("C"),
    Some("D"), Some("E"), Some("F"), Some("G"),
    Some("H"), Some("I"), Some("J"), Some("K"),
    Some("L"), Some("M"), Some("N"), Some("O"),
    Some("P"), Some("Q"), Some("R"), Some("S"),
    Some("T"), Some("U"), Some("V"), Some("W"),
    Some("X"), Some("Y"), Some("Z"), Some("bracketleft"),
    Some("backslash"), Some("bracketright"), Some("asciicircum"), Some("underscore"),
    Some("quoteleft"), Some("a"), Some("b"), Some("c"),
    Some("d"), Some("e"), Some("f"), Some("g"),
    Some("h"), Some("i"), Some("j"), Some("k"),
    Some("l"), Some("m"), Some("n"), Some("o"),
    Some("p"), Some("q"), Some("r"), Some("s"),
    Some("t"), Some("u"), Some("v"), Some("w"),
    Some("x"), Some("y"), Some("z"), Some("braceleft"),
    Some("bar"), Some("braceright"), Some("asciitilde"), None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, Some("exclamdown"), Some("cent"), Some("sterling"),
    Some("fraction"), Some("yen"), Some("florin"), Some("section"),
    Some("currency"), Some("quotesingle"), Some("quotedblleft"), Some("guillemotleft"),
    Some("guilsinglleft"), Some("guilsinglright"), Some("fi"), Some("fl"),
    None, Some("endash"), Some("dagger"), Some("daggerdbl"),
    Some("periodcentered"), None, Some("paragraph"), Some("bullet"),
    Some("quotesinglbase"), Some("quotedblbase"), Some("quotedblright"), Some("guillemotright"),
    Some("ellipsis"), Some("perthousand"), None, Some("questiondown"),
    None, Some("grave"), Some("acute"), Some("circumflex"),
    Some("tilde"), Some("macron"), Some("breve"), Some("dotaccent"),
    Some("dieresis"), None, Some("ring"), Some("cedilla"),
    None, Some("hungarumlaut"), Some("ogonek"), Some("caron"),
    Some("emdash"), None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, Some("AE"), None, Some("ordfeminine"),
    None, None, None, None,
    Some("Lslash"), Some("Oslash"), Some("OE"), Some("ordmasculine"),
    None, None, None, None,
    None, Some("ae"), None, None,
    None, Some("dotlessi"), None, None,
    Some("lslash"), Some("oslash"), Some("oe"), Some("germandbls"),
    None, None, None, None,
];

pub(crate) const WIN_ANSI_ENCODING: [Option<&str>; 256] = [
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    Some("space"), Some("exclam"), Some("quotedbl"), Some("numbersign"),
    Some("dollar"), Some("percent"), Some("ampersand"), Some("quotesingle"),
    Some("parenleft"), Some("parenright"), Some("asterisk"), Some("plus"),
    Some("comma"), Some("hyphen"), Some("period"), Some("slash"),
    Some("zero"), Some("one"), Some("two"), Some("three"),
    Some("four"), Some("five"), Some("six"), Some("seven"),
    Some("eight"), Some("nine"), Some("colon"), Some("semicolon"),
    Some("less"), Some("equal"), Some("greater"), Some("question"),
    Some("at"), Some("A"), Some("B"), Some("C"),
    Some("D"), Some("E"), Some("F"), Some("G"),
    Some("H"), Some("I"), Some("J"), Some("K"),
    Some("L"), Some("M"), Some("N"), Some("O"),
    Some("P"), Some("Q"), Some("R"), Some("S"),
    Some("T"), Some("U"), Some("V"), Some("W"),
    Some("X"), Some("Y"), Some("Z"), Some("bracketleft"),
    Some("backslash"), Some("bracketright"), Some("asciicircum"), Some("underscore"),
    Some("grave"), Some("a"), Some("b"), Some("c"),
    Some("d"), Some("e"), Some("f"), Some("g"),
    Some("h"), Some("i"), Some("j"), Some("k"),
    Some("l"), Some("m"), Some("n"), Some("o"),
    Some("p"), Some("q"), Some("r"), Some("s"),
    Some("t"), Some("u"), Some("v"), Some("w"),
    Some("x"), Some("y"), Some("z"), Some("braceleft"),
    Some("bar"), Some("braceright"), Some("asciitilde"), None,
    Some("Euro"), None, Some("quotesinglbase"), Some("florin"),
    Some("quotedblbase"), Some("ellipsis"), Some("dagger"), Some("daggerdbl"),
    Some("circumflex"), Some("perthousand"), Some("Scaron"), Some("guilsinglleft"),
    Some("OE"), None, Some("Zcaron"), None,
    None, Some("quoteleft"), Some("quoteright"), Some("quotedblleft"),
    Some("quotedblright"), Some("bullet"), Some("endash"), Some("emdash"),
    Some("tilde"), Some("trademark"), Some("scaron"), Some("guilsinglright"),
    Some("oe"), None, Some("zcaron"), Some("Ydieresis"),
    Some("space"), Some("exclamdown"), Some("cent"), Some("sterling"),
    Some("currency"), Some("yen"), Some("brokenbar"), Some("section"),
    Some("dieresis"), Some("copyright"), Some("ordfeminine"), Some("guillemotleft"),
    Some("logicalnot"), Some("hyphen"), Some("registered"), Some("macron"),
    Some("degree"), Some("plusminus"), Some("twosuperior"), Some("threesuperior"),
    Some("acute"), Some("mu"), Some("paragraph"), Some("periodcentered"),
    Some("cedilla"), Some("onesuperior"), Some("ordmasculine"), Some("guillemotright"),
    Some("onequarter"), Some("onehalf"), Some("threequarters"), Some("questiondown"),
    Some("Agrave"), Some("Aacute"), Some("Acircumflex"), Some("Atilde"),
    Some("Adieresis"), Some("Aring"), Some("AE"), Some("Ccedilla"),
    Some("Egrave"), Some("Eacute"), Some("Ecircumflex"), Some("Edieresis"),
    Some("Igrave"), Some("Iacute"), Some("Icircumflex"), Some("Idieresis"),
    Some("Eth"), Some("Ntilde"), Some("Ograve"), Some("Oacute"),
    Some("Ocircumflex"), Some("Otilde"), Some("Odieresis"), Some("multiply"),
    Some("Oslash"), Some("Ugrave"), Some("Uacute"), Some("Ucircumflex"),
    Some("Udieresis"), Some("Yacute"), Some("Thorn"), Some("germandbls"),
    Some("agrave"), Some("aacute"), Some("acircumflex"), Some("atilde"),
    Some("adieresis"), Some("aring"), Some("ae"), Some("ccedilla"),
    Some("egrave"), Some("eacute"), Some("ecircumflex"), Some("edieresis"),
    Some("igrave"), Some("iacute"), Some("icircumflex"), Some("idieresis"),
    Some("eth"), Some("ntilde"), Some("ograve"), Some("oacute"),
    Some("ocircumflex"), Some("otilde"), Some("odieresis"), Some("divide"),
    Some("oslash"), Some("ugrave"), Some("uacute"), Some("ucircumflex"),
    Some("udieresis"), Some("yacute"), Some("thorn"), Some("ydieresis"),
];

pub(crate) const MAC_ROMAN_ENCODING: [Option<&str>; 256] = [
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    None, None, None, None,
    Some("space"), Some("exclam"), Some("quotedbl"), Some("numbersign"),
    Some("dollar"), Some("percent"), Some("ampersand"), Some("quotesingle"),
    Some("parenleft"), Some("parenright"), Some("asterisk"), Some("plus"),
    Some("comma"), Some("hyphen"), Some("period"), Some("slash"),
    Some("zero"), Some("one"), Some("two"), Some("three"),
    Some("four"), Some("five"), Some("six"), Some("seven"),
    Some("eight"), Some("nine"), Some("colon"), Some("semicolon"),
    Some("less"), Some("equal"), Some("greater"), Some("question"),
    Some("at"), Some("A"), Some("B"), Some("C"),
    Some("D"), Some("E"), Some("F"), Some("G"),
    Some("H"), Some("I"), Some("J"), Some("K"),
    Some("L"), Some("M"), Some("N"), Some("O"),
    Some("P"), Some("Q"), Some("R"), Some("S"),
    Some("T"), Some("U"), Some("V"), Some("W"),
    Some("X"), Some("Y"), Some("Z"), Some("bracketleft"),
    Some("backslash"), Some("bracketright"), Some("asciicircum"), Some("underscore"),
    Some("grave"), Some("a"), Some("b"), Some("c"),
    Some("d"), Some("e"), Some("f"), Some("g"),
    Some("h"), Some("i"), Some("j"), Some("k"),
    Some("l"), Some("m"), Some("n"), Some("o"),
    Some("p"), Some("q"), Some("r"), Some("s"),
    Some("t"), Some("u"), Some("v"), Some("w"),
    Some("x"), Some("y"), Some("z"), Some("braceleft"),
    Some("bar"), Some("braceright"), Some("asciitilde"), None,
    Some("Adieresis"), Some("Aring"), Some("Ccedilla"), Some("Eacute"),
    Some("Ntilde"), Some("Odieresis"), Some("Udieresis"), Some("aacute"),
    Some("agrave"), Some("acircumflex"), Some("adieresis"), Some("atilde"),
    Some("aring"), Some("ccedilla"), Some("eacute"), Some("egrave"),
    Some("ecircumflex"), Some("edieresis"), Some("iacute"), Some("igrave"),
    Some("icircumflex"), Some("idieresis"), Some("ntilde"), Some("oacute"),
    Some("ograve"), Some("ocircumflex"), Some("odieresis"), Some("otilde"),
    Some("uacute"), Some("ugrave"), Some("ucircumflex"), Some("udieresis"),
    Some("dagger"), Some("degree"), Some("cent"), Some("sterling"),
    Some("section"), Some("bullet"), Some("paragraph"), Some("germandbls"),
    Some("registered"), Some("copyright"), Some("trademark"), Some("acute"),
    Some("dieresis"), Some("notequal"), Some("AE"), Some("Oslash"),
    Some("infinity"), Some("plusminus"), Some("lessequal"), Some("greaterequal"),
    Some("yen"), Some("mu"), Some("partialdiff"), Some("summation"),
    Some("product"), Some("pi"), Some("integral"), Some("ordfeminine"),
    Some("ordmasculine"), Some("Omega"), Some("ae"), Some("oslash"),
    Some("questiondown"), Some("exclamdown"), Some("logicalnot"), Some("radical"),
    Some("florin"), Some("approxequal"), Some("Delta"), Some("guillemotleft"),
    Some("guillemotright"), Some("ellipsis"), Some("space"), Some("Agrave"),
    Some("Atilde"), Some("Otilde"), Some("OE"), Some("oe"),
    Some("endash"), Some("emdash"), Some("quotedblleft"), Some("quotedblright"),
    Some("quoteleft"), Some("quoteright"), Some("divide"), Some("lozenge"),
    Some("ydieresis"), Some("Ydieresis"), Some("fraction"), Some("currency"),
    Some("guilsinglleft"), Some("guilsinglright"), Some("fi"), Some("fl"),
    Some("daggerdbl"), Some("periodcentered"), Some("quotesinglbase"), Some("quotedblbase"),
    Some("perthousand"), Some("Acircumflex"), Some("Ecircumflex"), Some("Aacute"),
    Some("Edieresis"), Some("Egrave"), Some("Iacute"), Some("Icircumflex"),
    Some("Idieresis"), Some("Igrave"), Some("Oacute"), Some("Ocircumflex"),
    Some("apple"), Some("Ograve"), Some("Uacute"), Some("Ucircumflex"),
    Some("Ugrave"), Some("dotlessi"), Some("circumflex"), Some("tilde"),
    Some("macron"), Some("breve"), Some("dotaccent"), Some("ring"),
    Some("cedilla"), Some("hungarumlaut"), Some("ogonek"), Some("caron"),
];
