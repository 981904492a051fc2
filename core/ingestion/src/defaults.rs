//! Built-in templates used to seed missing data files on first run.

pub const HISTORICAL_DATA: &str = r#"// DO NOT REMOVE THIS LINE [datatype="historical-data"]
// Demo historical data file (minimal).

animal, bird, fauna, owl, species, wildlife
fog, forest, nature, trees, wilderness, woods
animal, fauna, reptile, snake, species, wildlife
asphalt, autumn, fall, forest, highway, road, trees
boats, dusk, lake, outdoors, sunset, travel, vacation
beach, dusk, nature, outdoors, sea, sunset, travel, vacation
child, hat, market, shawl, woman
child, childhood, flowers, girl, grass, meadow
animal, elephant, fauna, safari, species, wildlife
"#;

pub const NOTIFY_DATA: &str = r#"// DO NOT REMOVE THIS LINE [datatype="notify-data"]
// Demo notify data file (empty)

"#;

pub const LEARN_DATA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root datatype="learn-data" comment="Default learn data file">
  <item tag="acrylic" suggest="art" score="2" />
  <item tag="animal" suggest="species" score="1" />
  <item tag="bird" suggest="wildlife" score="1" />
  <item tag="elephant" suggest="animal" score="1" />
  <item tag="giraffe" suggest="animal" score="1" />
  <item tag="grapes" suggest="fruit" score="1" />
  <item tag="lemon" suggest="citrus" score="1" />
</root>
"#;

pub const CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root datatype="config">
  <language>
    <spellchecker>en-US</spellchecker>
  </language>
  <presets>
    <preset text="">
      <tag></tag>
      <tag></tag>
    </preset>
    <preset text="">
      <tag></tag>
    </preset>
    <preset text="">
      <tag></tag>
    </preset>
    <preset text="">
      <tag></tag>
    </preset>
    <preset text="">
      <tag></tag>
    </preset>
  </presets>
  <tags>
    <max>10</max>
  </tags>
</root>
"#;
